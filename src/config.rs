//! Client configuration loaded from YAML.
//!
//! ## Example
//!
//! ```rust
//! use remote_imgui::ClientConfig;
//!
//! let config = ClientConfig::from_yaml_str(
//!     "server_uri: ws://192.168.1.20:7002\ncompressed: true\n",
//! )
//! .unwrap();
//! assert!(config.compressed);
//! assert_eq!(config.max_draw_lists, 20);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{MAX_DRAW_LISTS, MAX_TRIANGLES};
use crate::types::Rgb;
use crate::{RemoteError, Result};

/// Largest index count a u16 index buffer can address.
const U16_INDEX_LIMIT: usize = 1 << 16;

/// Settings for one remote display client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address, reported in the connection status
    pub server_uri: String,
    /// Canvas width of the source application
    pub target_width: u32,
    /// Canvas height of the source application
    pub target_height: u32,
    /// Local canvas width
    pub canvas_width: u32,
    /// Local canvas height, used to flip clip rectangles
    pub canvas_height: u32,
    /// Binary messages are LZ4 frames
    pub compressed: bool,
    /// Draw-list slots in the geometry pool
    pub max_draw_lists: usize,
    /// Triangle budget per draw list
    pub max_triangles: usize,
    pub active_color: Rgb,
    pub inactive_color: Rgb,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_uri: "ws://127.0.0.1:7002".to_string(),
            target_width: 1280,
            target_height: 720,
            canvas_width: 1280,
            canvas_height: 720,
            compressed: false,
            max_draw_lists: MAX_DRAW_LISTS,
            max_triangles: MAX_TRIANGLES,
            active_color: Rgb::ACTIVE,
            inactive_color: Rgb::INACTIVE,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::parse(yaml, PathBuf::from("<memory>"))
    }

    /// Load and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let yaml = std::fs::read_to_string(&path)
            .map_err(|e| RemoteError::file_error(path.clone(), e))?;
        Self::parse(&yaml, path)
    }

    fn parse(yaml: &str, path: PathBuf) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| RemoteError::config_error(path.clone(), e.to_string()))?;
        config.check().map_err(|details| RemoteError::config_error(path.clone(), details))?;
        debug!("Loaded client config from {}", path.display());
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| RemoteError::config_error(PathBuf::from("<memory>"), e.to_string()))
    }

    /// Check invariants the geometry pool relies on.
    pub fn validate(&self) -> Result<()> {
        self.check()
            .map_err(|details| RemoteError::config_error(PathBuf::from("<memory>"), details))
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.max_draw_lists == 0 {
            return Err("max_draw_lists must be at least 1".to_string());
        }
        if self.max_triangles == 0 {
            return Err("max_triangles must be at least 1".to_string());
        }
        let indices = self.max_triangles.checked_mul(3).unwrap_or(usize::MAX);
        if indices > U16_INDEX_LIMIT {
            return Err(format!(
                "max_triangles {} needs {} indices, more than u16 indices can address",
                self.max_triangles, indices
            ));
        }
        if self.canvas_height == 0 || self.canvas_width == 0 {
            return Err("canvas size must be non-zero".to_string());
        }
        Ok(())
    }
}
