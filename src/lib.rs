//! Remote display client for immediate-mode GUI draw lists.
//!
//! A source application streams its GUI as compact binary draw lists over a
//! persistent connection. This crate decodes them, reconstructs delta frames,
//! keeps the geometry in a pre-sized pool and replays it through a render
//! backend under per-command scissor rectangles. Input events travel back as
//! short text commands.
//!
//! # Features
//!
//! - **Wire Codec**: quantized vertices, key and delta frames, LZ4 framing
//! - **Fixed Pool**: geometry buffers allocated once, double-buffered commits
//! - **Backend Agnostic**: rendering goes through the [`RenderBackend`] trait
//! - **Capture Replay**: record a session once, replay it anywhere
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use remote_imgui::{ClientConfig, RemoteImgui};
//! # use remote_imgui::{FontTexture, GeometrySlot, Rgb, ScissorRect};
//! # struct Gpu;
//! # impl remote_imgui::RenderBackend for Gpu {
//! #     fn clear(&mut self, _: Rgb) {}
//! #     fn draw_background(&mut self, _: u32, _: u32, _: Rgb) {}
//! #     fn set_scissor(&mut self, _: Option<ScissorRect>) {}
//! #     fn upload_font_texture(&mut self, _: &FontTexture) {}
//! #     fn draw_indexed(&mut self, _: &GeometrySlot, _: std::ops::Range<u32>, _: [f32; 2]) {}
//! # }
//!
//! #[tokio::main]
//! async fn main() -> remote_imgui::Result<()> {
//!     let config = ClientConfig::load("remote.yaml")?;
//!     let channels = RemoteImgui::replay("session.rimc", config, Gpu)?;
//!
//!     let output = channels.task.await.expect("driver task panicked");
//!     println!("Decoded {} frames", output.session.stats().frames);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire decoding pipeline
pub mod codec;
pub mod cursor;
pub mod decoder;
pub mod geometry;
pub mod render;

// Session and its collaborators
pub mod config;
pub mod connection;
pub mod control;
pub mod input;
pub mod session;

// Message sources
pub mod capture;
pub mod driver;
pub mod transport;

// Core exports
pub use error::*;
pub use types::*;

pub use codec::{Decoded, FrameCodec, diff_against};
pub use config::ClientConfig;
pub use connection::{ConnectionEvent, ConnectionState};
pub use control::{ControlSurface, WindowChoice, WindowSelector};
pub use decoder::{DrawListDecoder, FrameSummary};
pub use driver::{Driver, DriverChannels, DriverExit, DriverOutput, UiEvent};
pub use geometry::{GeometrySlot, GeometryStore};
pub use input::InputCommand;
pub use render::{ClippedRenderer, RenderBackend, RenderStats, ScissorRect};
pub use session::{BinaryOutcome, RenderSession, SessionStats};
pub use transport::{ChannelHandle, ChannelTransport, Message, ReplayTransport, Transport};

/// Default capacity of the channels between a socket task and the driver.
const CHANNEL_BUFFER: usize = 256;

/// Unified entry point for remote display sessions.
///
/// Builds a [`RenderSession`] from a config and spawns the [`Driver`] for a
/// transport. Must be called from within a tokio runtime.
pub struct RemoteImgui;

impl RemoteImgui {
    /// Drive `backend` from any transport.
    pub fn attach<T, B>(
        transport: T,
        config: ClientConfig,
        backend: B,
    ) -> Result<DriverChannels<B>>
    where
        T: Transport,
        B: RenderBackend + Send + 'static,
    {
        let session = RenderSession::new(config)?;
        Ok(Driver::spawn(transport, session, backend))
    }

    /// Drive `backend` from an externally managed socket.
    ///
    /// The returned [`ChannelHandle`] is the socket side: push received
    /// messages and lifecycle events into it and forward its outbound text.
    pub fn channel<B>(
        config: ClientConfig,
        backend: B,
    ) -> Result<(DriverChannels<B>, ChannelHandle)>
    where
        B: RenderBackend + Send + 'static,
    {
        let (transport, handle) = ChannelTransport::pair(CHANNEL_BUFFER);
        Ok((Self::attach(transport, config, backend)?, handle))
    }

    /// Replay a capture file into `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config is invalid
    /// - The capture file does not exist or is not readable
    /// - The capture header is not a supported capture format
    pub fn replay<P, B>(path: P, config: ClientConfig, backend: B) -> Result<DriverChannels<B>>
    where
        P: AsRef<std::path::Path>,
        B: RenderBackend + Send + 'static,
    {
        Self::attach(ReplayTransport::open(path)?, config, backend)
    }
}
