use crate::machine::interrupt::{InterruptController, InterruptSource};

/// OSC1 ticks per count for each PTC setting. 0 and 1 select the external
/// clock on K13 and never count from OSC1.
const DIVIDERS: [u32; 8] = [0, 0, 256, 128, 64, 32, 8, 4];

/// Programmable down-counter (PD/RD, F24..F27; control F78/F79).
///
/// Each count decrements `data`; reaching zero reloads from `reload` and
/// raises IPT (F02 bit 0).
#[derive(Clone, Debug, Default)]
pub(crate) struct ProgTimer {
    pub(crate) running: bool,
    pub(crate) data: u8,
    pub(crate) reload: u8,
    pub(crate) clock_select: u8,
    pub(crate) prescaler: u32,
}

impl ProgTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn divider(&self) -> u32 {
        DIVIDERS[(self.clock_select & 0x7) as usize]
    }

    #[inline]
    pub(crate) fn external_clock(&self) -> bool {
        self.divider() == 0
    }

    /// PTRST: reload the counter from RD.
    pub(crate) fn restart(&mut self) {
        self.data = self.reload;
        self.prescaler = 0;
    }

    pub(crate) fn set_reload_nibble(&mut self, high: bool, value: u8) {
        let value = value & 0xF;
        self.reload = if high {
            (self.reload & 0x0F) | (value << 4)
        } else {
            (self.reload & 0xF0) | value
        };
    }

    /// Advance by one OSC1 tick. Returns true when the counter stepped.
    pub(crate) fn tick(&mut self, irq: &mut InterruptController) -> bool {
        let divider = self.divider();
        if !self.running || divider == 0 {
            return false;
        }
        self.prescaler += 1;
        if self.prescaler < divider {
            return false;
        }
        self.prescaler = 0;
        self.count(irq);
        true
    }

    /// Falling edge on K13 while the external clock is selected.
    pub(crate) fn external_edge(&mut self, irq: &mut InterruptController) -> bool {
        if !self.running || !self.external_clock() {
            return false;
        }
        self.count(irq);
        true
    }

    fn count(&mut self, irq: &mut InterruptController) {
        self.data = self.data.wrapping_sub(1);
        if self.data == 0 {
            self.data = self.reload;
            irq.raise(InterruptSource::ProgTimer, 0x1);
        }
    }
}
