use bitflags::bitflags;

use crate::{DISPLAY_FRAME_SIZE, VRAM_SIZE};

bitflags! {
    /// LCD control register (F71).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LcdControl: u8 {
        /// LCD clock source select.
        const CLOCK_SELECT = 0b0001;
        /// Drive duty select.
        const LDUTY = 0b0010;
        /// All segments on.
        const ALON = 0b0100;
        /// All segments off.
        const ALOFF = 0b1000;
    }
}

/// One display frame: 160 VRAM nibbles followed by P0..P3 and R0..R3,
/// which some firmware uses for extra indicator segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFrame {
    pub generation: u64,
    pub nibbles: [u8; DISPLAY_FRAME_SIZE],
}

impl DisplayFrame {
    pub(crate) fn compose(
        generation: u64,
        lcd: LcdControl,
        vram: &[u8; VRAM_SIZE],
        ports: [u8; 4],
        outputs: [u8; 4],
    ) -> Self {
        let mut nibbles = [0u8; DISPLAY_FRAME_SIZE];
        // ALOFF wins over ALON.
        let blank = lcd.contains(LcdControl::ALOFF);
        if !blank && lcd.contains(LcdControl::ALON) {
            nibbles.fill(0xF);
        } else if !blank {
            nibbles[..VRAM_SIZE].copy_from_slice(vram);
            nibbles[VRAM_SIZE..VRAM_SIZE + 4].copy_from_slice(&ports);
            nibbles[VRAM_SIZE + 4..].copy_from_slice(&outputs);
        }
        Self {
            generation,
            nibbles,
        }
    }

    pub fn vram(&self) -> &[u8] {
        &self.nibbles[..VRAM_SIZE]
    }

    /// P0..P3 then R0..R3.
    pub fn trailing(&self) -> &[u8] {
        &self.nibbles[VRAM_SIZE..]
    }

    pub fn is_blank(&self) -> bool {
        self.nibbles.iter().all(|&n| n == 0)
    }
}
