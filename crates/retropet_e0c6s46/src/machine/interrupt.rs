/// One of the six maskable interrupt sources.
///
/// The discriminant is the register offset of the source's factor
/// (`0xF00 + n`) and mask (`0xF10 + n`) registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterruptSource {
    ClockTimer = 0,
    Stopwatch = 1,
    ProgTimer = 2,
    Serial = 3,
    K0 = 4,
    K1 = 5,
}

impl InterruptSource {
    pub const COUNT: usize = 6;

    /// Register order (F00..F05).
    pub const ALL: [InterruptSource; Self::COUNT] = [
        InterruptSource::ClockTimer,
        InterruptSource::Stopwatch,
        InterruptSource::ProgTimer,
        InterruptSource::Serial,
        InterruptSource::K0,
        InterruptSource::K1,
    ];

    /// Service order, highest priority first.
    pub const PRIORITY: [InterruptSource; Self::COUNT] = [
        InterruptSource::ProgTimer,
        InterruptSource::Serial,
        InterruptSource::K1,
        InterruptSource::K0,
        InterruptSource::Stopwatch,
        InterruptSource::ClockTimer,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Step address of the handler within page 1 of the current bank.
    pub const fn vector(self) -> u8 {
        match self {
            InterruptSource::ProgTimer => 0x0C,
            InterruptSource::Serial => 0x0A,
            InterruptSource::K1 => 0x08,
            InterruptSource::K0 => 0x06,
            InterruptSource::Stopwatch => 0x04,
            InterruptSource::ClockTimer => 0x02,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Factor flags, enable masks and trigger latches for the six sources.
///
/// A source is latched as triggered when one of its factor bits is raised
/// while the matching mask bit is set. The CPU clears the latch when it
/// accepts the interrupt; reading the factor register clears both.
#[derive(Clone, Debug, Default)]
pub(crate) struct InterruptController {
    pub(crate) factors: [u8; InterruptSource::COUNT],
    pub(crate) masks: [u8; InterruptSource::COUNT],
    pub(crate) triggered: [bool; InterruptSource::COUNT],
    pub(crate) trigger_counts: [u64; InterruptSource::COUNT],
}

impl InterruptController {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Set factor bits of `source`.
    pub(crate) fn raise(&mut self, source: InterruptSource, bits: u8) {
        let i = source.index();
        let bits = bits & 0xF;
        if bits == 0 {
            return;
        }
        self.factors[i] |= bits;
        if self.masks[i] & bits != 0 {
            self.triggered[i] = true;
            self.trigger_counts[i] += 1;
        }
    }

    /// Read-to-acknowledge access to a factor register.
    pub(crate) fn take_factor(&mut self, source: InterruptSource) -> u8 {
        let i = source.index();
        let value = self.factors[i];
        self.factors[i] = 0;
        self.triggered[i] = false;
        value
    }

    #[inline]
    pub(crate) fn factor(&self, source: InterruptSource) -> u8 {
        self.factors[source.index()]
    }

    #[inline]
    pub(crate) fn mask(&self, source: InterruptSource) -> u8 {
        self.masks[source.index()]
    }

    /// Write a mask register. Unmasking a bit whose factor is already
    /// pending latches the source.
    pub(crate) fn set_mask(&mut self, source: InterruptSource, value: u8) {
        let i = source.index();
        let value = value & 0xF;
        let newly_enabled = value & !self.masks[i];
        self.masks[i] = value;
        if self.factors[i] & newly_enabled != 0 && !self.triggered[i] {
            self.triggered[i] = true;
            self.trigger_counts[i] += 1;
        }
    }

    pub(crate) fn any_triggered(&self) -> bool {
        self.triggered.iter().any(|&t| t)
    }

    /// Clear and return the highest-priority triggered source.
    pub(crate) fn acknowledge(&mut self) -> Option<InterruptSource> {
        let source = InterruptSource::PRIORITY
            .into_iter()
            .find(|source| self.triggered[source.index()])?;
        self.triggered[source.index()] = false;
        Some(source)
    }
}
