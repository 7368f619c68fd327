//! Core types for the remote draw-list protocol.
//!
//! ## Architecture
//!
//! The types map directly onto the wire format:
//! - [`MessageKind`] is the leading tag byte of every binary message
//! - [`RawFrame`] is a whole message buffer, retained as delta patch base
//! - [`Vertex`] is one dequantized vertex (position, uv, color, alpha)
//! - [`DrawCommand`] is a clip-scoped index range of a draw list
//! - [`FontTexture`] is the RGBA expansion of the alpha-only font atlas
//! - [`Rgb`] is a packed canvas clear color
//!
//! ## Usage Example
//!
//! ```rust
//! use remote_imgui::types::{ClipRect, DrawCommand, MessageKind};
//!
//! let kind = MessageKind::try_from(254u8).unwrap();
//! assert!(kind.is_frame());
//!
//! let command = DrawCommand {
//!     element_count: 6,
//!     clip_rect: ClipRect::new(0.0, 0.0, 64.0, 32.0),
//!     start: 3,
//! };
//! assert_eq!(command.elements(), 3..9);
//! ```

mod color;
mod draw;
mod frame;
mod message;
mod texture;
mod vertex;

pub use color::Rgb;
pub use draw::{ClipRect, DrawCommand};
pub use frame::RawFrame;
pub use message::MessageKind;
pub use texture::FontTexture;
pub(crate) use texture::texel_count;
pub use vertex::Vertex;
