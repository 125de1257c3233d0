use crate::cpu::{Cpu, Flags, OpClass};

impl Cpu {
    /// HALT and SLP both stop the core until an interrupt is serviced.
    pub(super) fn exec_halt(&mut self, class: OpClass) {
        log::trace!("E0C6S46 {} at pc=0x{:04X}", class.mnemonic(), self.regs.pc);
        self.halted = true;
    }

    pub(super) fn exec_undefined(&mut self, opcode: u16) {
        log::trace!(
            "E0C6S46 undefined opcode 0x{:03X} at pc=0x{:04X}",
            opcode,
            self.regs.pc
        );
        self.undefined_opcodes += 1;
    }

    /// SET F,i: OR the immediate into the flag register.
    pub(super) fn exec_set_flags(&mut self, mask: u8) {
        self.regs.flags |= Flags::from_bits_truncate(mask);
    }

    /// RST F,i: AND the immediate into the flag register.
    pub(super) fn exec_reset_flags(&mut self, mask: u8) {
        self.regs.flags &= Flags::from_bits_truncate(mask);
    }
}
