//! Message kinds carried in the first byte of every binary message

use serde::{Deserialize, Serialize};

use crate::{RemoteError, Result};

/// Kind tag of a binary message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    /// Alpha-only font atlas, sent once per connection
    FontTexture = 255,
    /// Complete frame, becomes the new patch base
    FrameKey = 254,
    /// Frame encoded as a byte-wise additive delta against the patch base
    FrameDiff = 253,
}

impl MessageKind {
    /// Wire tag of this kind.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Whether the message carries draw lists.
    pub const fn is_frame(self) -> bool {
        matches!(self, MessageKind::FrameKey | MessageKind::FrameDiff)
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = RemoteError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            255 => Ok(MessageKind::FontTexture),
            254 => Ok(MessageKind::FrameKey),
            253 => Ok(MessageKind::FrameDiff),
            _ => Err(RemoteError::UnknownMessage { tag }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in [MessageKind::FontTexture, MessageKind::FrameKey, MessageKind::FrameDiff] {
            assert_eq!(MessageKind::try_from(kind.tag()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_tags_are_rejected() {
        assert!(matches!(MessageKind::try_from(0), Err(RemoteError::UnknownMessage { tag: 0 })));
        assert!(matches!(
            MessageKind::try_from(252),
            Err(RemoteError::UnknownMessage { tag: 252 })
        ));
    }
}
