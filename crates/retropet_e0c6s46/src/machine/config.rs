use typed_builder::TypedBuilder;

use crate::DEFAULT_CPU_CLOCK_HZ;

/// Where the 12-bit opcode sits inside each 16-bit ROM word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum OpcodeAlignment {
    /// Opcode in bits 15..4.
    #[default]
    UpperBits,
    /// Opcode in bits 11..0, as in most E0C6S46 ROM dumps.
    LowerBits,
}

impl OpcodeAlignment {
    #[inline]
    pub fn extract(self, word: u16) -> u16 {
        match self {
            OpcodeAlignment::UpperBits => word >> 4,
            OpcodeAlignment::LowerBits => word & 0x0FFF,
        }
    }
}

/// Board-level configuration fixed at construction time.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct MachineConfig {
    /// CPU clock in Hz.
    #[builder(default = DEFAULT_CPU_CLOCK_HZ)]
    pub clock_hz: u32,
    /// Pull-up level of each K0 pin when released.
    #[builder(default = 0xF)]
    pub k0_pullup: u8,
    #[builder(default = 0xF)]
    pub k1_pullup: u8,
    /// P3 is hard-wired as an output, ignoring IOC3.
    #[builder(default = false)]
    pub port3_dedicated: bool,
    #[builder(default)]
    pub opcode_alignment: OpcodeAlignment,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
