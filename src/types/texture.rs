//! Font atlas expanded from the alpha-only wire format

use crate::{RemoteError, Result};

/// RGBA font atlas.
///
/// Every texel is white; coverage lives in the alpha channel only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontTexture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FontTexture {
    /// Bytes per expanded texel.
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Expand `width * height` alpha bytes into white RGBA texels.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8]) -> Result<Self> {
        let texels = texel_count(width, height)?;
        if alpha.len() != texels {
            return Err(RemoteError::truncated(0, texels, alpha.len()));
        }

        let mut pixels = Vec::with_capacity(texels * Self::BYTES_PER_PIXEL);
        for &a in alpha {
            pixels.extend_from_slice(&[0xFF, 0xFF, 0xFF, a]);
        }

        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Texel at `(x, y)`, if inside the atlas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let texel = self.pixels.get(start..start + Self::BYTES_PER_PIXEL)?;
        Some([texel[0], texel[1], texel[2], texel[3]])
    }
}

/// Number of texels in a `width × height` atlas, guarding against overflow.
pub(crate) fn texel_count(width: u32, height: u32) -> Result<usize> {
    let limit = usize::MAX / FontTexture::BYTES_PER_PIXEL;
    let texels = u64::from(width) * u64::from(height);
    usize::try_from(texels).ok().filter(|&count| count <= limit).ok_or_else(|| {
        RemoteError::capacity(
            "font texture texels",
            usize::try_from(texels).unwrap_or(usize::MAX),
            limit,
        )
    })
}
