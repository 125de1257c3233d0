mod alu;
pub mod decode;
mod exec;
mod helpers;
mod interrupts;
pub mod regs;

#[cfg(test)]
mod tests;

pub use decode::{decode, OpClass};
pub use regs::{Flags, IndexPart, IndexReg, Operand, Registers, INDEX_MASK, PC_MASK};

/// Extra clock cycles charged for entering an interrupt handler.
pub const INTERRUPT_CYCLES: u32 = 12;

/// Abstraction over the E0C6S46 data bus (RAM, VRAM and I/O) and the
/// program ROM.
///
/// Addresses are 12-bit nibble addresses and every value is a nibble; the
/// implementor is responsible for masking and for any register side
/// effects.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);

    /// Fetch the 12-bit instruction word at a 13-bit program counter.
    fn fetch(&mut self, pc: u16) -> u16;

    /// Pick the highest-priority interrupt source that is latched as
    /// triggered, clear its latch and return its vector step.
    ///
    /// Buses without an interrupt controller can keep the default.
    fn acknowledge_interrupt(&mut self) -> Option<u8> {
        None
    }
}

/// E0C6200 CPU core.
///
/// Holds the register file plus the halt/reset latches and the
/// one-instruction interrupt hold that follows PSET or enabling `I`.
#[derive(Clone, Debug)]
pub struct Cpu {
    pub regs: Registers,
    pub halted: bool,
    /// Reset line held: the core does not fetch while this is set.
    pub in_reset: bool,
    /// Interrupts are not accepted after the instruction that set this.
    pub(crate) interrupt_hold: bool,
    /// Address the current instruction continues at; branch handlers
    /// overwrite it.
    next_pc: u16,
    /// Set by PSET so the end-of-instruction NP reload is skipped.
    pset_pending: bool,
    pub(crate) instructions: u64,
    pub(crate) undefined_opcodes: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub const RESET_PC: u16 = 0x0100;
    pub const RESET_NP: u8 = 0x01;

    pub fn new() -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            halted: false,
            in_reset: false,
            interrupt_hold: false,
            next_pc: 0,
            pset_pending: false,
            instructions: 0,
            undefined_opcodes: 0,
        };
        cpu.reset();
        cpu
    }

    /// Reset the CPU to its power-on state. Counters are cleared as well.
    pub fn reset(&mut self) {
        self.regs = Registers {
            pc: Self::RESET_PC,
            np: Self::RESET_NP,
            ..Registers::default()
        };
        self.halted = false;
        self.in_reset = false;
        self.interrupt_hold = false;
        self.next_pc = Self::RESET_PC;
        self.pset_pending = false;
        self.instructions = 0;
        self.undefined_opcodes = 0;
    }

    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    pub fn undefined_opcodes(&self) -> u64 {
        self.undefined_opcodes
    }

    /// Fetch, decode and execute one instruction and return its cycle
    /// cost. The caller is expected to have checked `halted`/`in_reset`.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let pc = self.regs.pc;
        let opcode = bus.fetch(pc) & 0x0FFF;
        let class = decode(opcode);
        let interrupts_were_enabled = self.regs.flag(Flags::I);

        self.next_pc = (pc + 1) & PC_MASK;
        self.pset_pending = false;

        self.exec_opcode(bus, class, opcode);

        self.regs.pc = self.next_pc & PC_MASK;
        if !self.pset_pending {
            self.regs.np = self.regs.pc_np();
        }
        self.interrupt_hold =
            self.pset_pending || (!interrupts_were_enabled && self.regs.flag(Flags::I));
        self.instructions += 1;

        class.cycles()
    }
}
