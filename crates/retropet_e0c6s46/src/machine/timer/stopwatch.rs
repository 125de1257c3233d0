use crate::machine::interrupt::{InterruptController, InterruptSource};
use crate::OSC1_HZ;

/// Fixed-point step: each OSC1 tick adds 100 and one 1/100 s count is
/// taken per `OSC1_HZ` accumulated.
const STEP: u32 = 100;

/// BCD stopwatch (SWL/SWH, F22/F23).
///
/// SWL counts 1/100 s and SWH 1/10 s. SWL rolling over raises ISW0
/// (10 Hz, F01 bit 0); SWH rolling over raises ISW1 (1 Hz, F01 bit 1).
#[derive(Clone, Debug, Default)]
pub(crate) struct Stopwatch {
    pub(crate) running: bool,
    pub(crate) accumulator: u32,
    pub(crate) swl: u8,
    pub(crate) swh: u8,
}

impl Stopwatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// SWRST
    pub(crate) fn reset_count(&mut self) {
        self.accumulator = 0;
        self.swl = 0;
        self.swh = 0;
    }

    /// Advance by one OSC1 tick. Returns true on a 1/100 s count.
    pub(crate) fn tick(&mut self, irq: &mut InterruptController) -> bool {
        if !self.running {
            return false;
        }
        self.accumulator += STEP;
        if self.accumulator < OSC1_HZ {
            return false;
        }
        self.accumulator -= OSC1_HZ;
        self.count(irq);
        true
    }

    fn count(&mut self, irq: &mut InterruptController) {
        self.swl += 1;
        if self.swl < 10 {
            return;
        }
        self.swl = 0;
        irq.raise(InterruptSource::Stopwatch, 0x1);

        self.swh += 1;
        if self.swh >= 10 {
            self.swh = 0;
            irq.raise(InterruptSource::Stopwatch, 0x2);
        }
    }
}
