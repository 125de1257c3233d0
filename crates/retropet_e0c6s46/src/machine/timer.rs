//! Timers derived from OSC1: the free-running clock timer lives here, the
//! stopwatch and programmable timer in submodules.
mod programmable;
mod stopwatch;

pub(crate) use programmable::ProgTimer;
pub(crate) use stopwatch::Stopwatch;

use super::interrupt::{InterruptController, InterruptSource};

/// OSC1 ticks per clock-timer count (32768 Hz / 256 Hz).
pub(crate) const CLOCK_TIMER_PRESCALE: u16 = 128;

/// Clock timer (TM0..TM7, F20/F21).
///
/// An 8-bit counter incremented at 256 Hz. Falling edges of TM2, TM4, TM6
/// and TM7 raise the 32 Hz, 8 Hz, 2 Hz and 1 Hz factors (IT32, IT8, IT2,
/// IT1 = F00 bits 0..3).
#[derive(Clone, Debug, Default)]
pub(crate) struct ClockTimer {
    pub(crate) prescaler: u16,
    pub(crate) counter: u8,
}

impl ClockTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// TMRST
    pub(crate) fn reset_counter(&mut self) {
        self.prescaler = 0;
        self.counter = 0;
    }

    #[inline]
    pub(crate) fn low(&self) -> u8 {
        self.counter & 0xF
    }

    #[inline]
    pub(crate) fn high(&self) -> u8 {
        self.counter >> 4
    }

    /// Advance by one OSC1 tick. Returns true when the counter stepped.
    pub(crate) fn tick(&mut self, irq: &mut InterruptController) -> bool {
        self.prescaler += 1;
        if self.prescaler < CLOCK_TIMER_PRESCALE {
            return false;
        }
        self.prescaler = 0;

        let old = self.counter;
        self.counter = self.counter.wrapping_add(1);
        let falling = old & !self.counter;

        let mut factors = 0;
        if falling & 0x04 != 0 {
            factors |= 0x1;
        }
        if falling & 0x10 != 0 {
            factors |= 0x2;
        }
        if falling & 0x40 != 0 {
            factors |= 0x4;
        }
        if falling & 0x80 != 0 {
            factors |= 0x8;
        }
        irq.raise(InterruptSource::ClockTimer, factors);
        true
    }
}
