//! Packed 0xRRGGBB colors used for canvas clears

use serde::{Deserialize, Serialize};

/// A 24-bit RGB color stored as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub u32);

impl Rgb {
    /// Background of the source canvas while a session is active.
    pub const ACTIVE: Rgb = Rgb(0x72909a);
    /// Darkened background shown while no session is active.
    pub const INACTIVE: Rgb = Rgb(0x444444);

    pub const fn red(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    pub const fn green(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub const fn blue(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Channels normalized to `[0, 1]`.
    pub fn to_f32(self) -> [f32; 3] {
        [
            crate::cursor::quantized_u8(self.red()),
            crate::cursor::quantized_u8(self.green()),
            crate::cursor::quantized_u8(self.blue()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_unpack_from_hex() {
        assert_eq!(Rgb::ACTIVE.red(), 0x72);
        assert_eq!(Rgb::ACTIVE.green(), 0x90);
        assert_eq!(Rgb::ACTIVE.blue(), 0x9a);
        assert_eq!(Rgb(0xFFFFFF).to_f32(), [1.0, 1.0, 1.0]);
    }
}
