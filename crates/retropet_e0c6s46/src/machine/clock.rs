use crate::OSC1_HZ;

/// Converts CPU cycles into OSC1 ticks without accumulating error.
///
/// `residual` counts CPU cycles left until the next tick. Consuming cycles
/// decrements it; every time it drops to zero or below one tick fires and
/// the divider is added back, so the fractional part carries over instead
/// of being rounded away.
#[derive(Clone, Debug, PartialEq)]
pub struct OscillatorClock {
    cycles_per_tick: f64,
    residual: f64,
}

impl OscillatorClock {
    pub fn new(clock_hz: u32) -> Self {
        // Never less than one CPU cycle per tick (also covers clock_hz == 0).
        let cycles_per_tick = (clock_hz as f64 / OSC1_HZ as f64).max(1.0);
        Self {
            cycles_per_tick,
            residual: cycles_per_tick,
        }
    }

    #[inline]
    pub fn cycles_per_tick(&self) -> f64 {
        self.cycles_per_tick
    }

    /// CPU cycles until the next OSC1 tick.
    #[inline]
    pub fn residual(&self) -> f64 {
        self.residual
    }

    pub(crate) fn set_residual(&mut self, residual: f64) {
        if residual.is_finite() && residual > 0.0 && residual <= self.cycles_per_tick {
            self.residual = residual;
        } else {
            log::warn!("E0C6S46 clock: ignoring out-of-range residual {}", residual);
        }
    }

    pub fn reset(&mut self) {
        self.residual = self.cycles_per_tick;
    }

    /// Consume CPU cycles and return how many OSC1 ticks elapsed.
    pub fn consume(&mut self, cycles: f64) -> u64 {
        self.residual -= cycles;
        let mut ticks = 0;
        while self.residual <= 0.0 {
            self.residual += self.cycles_per_tick;
            ticks += 1;
        }
        ticks
    }
}
