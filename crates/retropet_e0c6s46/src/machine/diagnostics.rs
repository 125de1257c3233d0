use super::interrupt::InterruptSource;

/// Read-only counters for integrators.
///
/// None of these influence emulation; they exist so a host can spot a
/// stuck PC or an interrupt storm.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    pub instructions: u64,
    pub undefined_opcodes: u64,
    pub interrupts: u64,
    pub last_interrupt_vector: Option<u8>,
    /// Trigger latches per source, indexed by `InterruptSource::index`.
    pub interrupt_triggers: [u64; InterruptSource::COUNT],
    pub oscillator_ticks: u64,
    pub clock_timer_ticks: u64,
    pub stopwatch_ticks: u64,
    pub prog_timer_ticks: u64,
    /// CPU cycles spent idling in HALT/SLP.
    pub halted_cycles: f64,
}

impl Diagnostics {
    pub fn triggers(&self, source: InterruptSource) -> u64 {
        self.interrupt_triggers[source.index()]
    }
}
