use crate::cpu::{Bus, Cpu, Flags, IndexPart, IndexReg, Operand};

impl Cpu {
    pub(super) fn exec_push_r<B: Bus>(&mut self, bus: &mut B, src: Operand) {
        let value = self.read_operand(bus, src);
        self.push_nibble(bus, value);
    }

    pub(super) fn exec_pop_r<B: Bus>(&mut self, bus: &mut B, dst: Operand) {
        let value = self.pop_nibble(bus);
        self.write_operand(bus, dst, value);
    }

    pub(super) fn exec_push_index_part<B: Bus>(
        &mut self,
        bus: &mut B,
        reg: IndexReg,
        part: IndexPart,
    ) {
        let value = self.regs.index_part(reg, part);
        self.push_nibble(bus, value);
    }

    pub(super) fn exec_pop_index_part<B: Bus>(
        &mut self,
        bus: &mut B,
        reg: IndexReg,
        part: IndexPart,
    ) {
        let value = self.pop_nibble(bus);
        self.regs.set_index_part(reg, part, value);
    }

    pub(super) fn exec_push_flags<B: Bus>(&mut self, bus: &mut B) {
        let value = self.regs.flags.bits();
        self.push_nibble(bus, value);
    }

    /// POP F. Restoring I this way is subject to the same one-instruction
    /// interrupt hold as SET F.
    pub(super) fn exec_pop_flags<B: Bus>(&mut self, bus: &mut B) {
        let value = self.pop_nibble(bus);
        self.regs.flags = Flags::from_bits_truncate(value);
    }

    /// LD SPH,r / LD SPL,r
    pub(super) fn exec_ld_sp_nibble<B: Bus>(&mut self, bus: &mut B, high: bool, src: Operand) {
        let value = self.read_operand(bus, src);
        self.regs.sp = if high {
            (self.regs.sp & 0x0F) | (value << 4)
        } else {
            (self.regs.sp & 0xF0) | value
        };
    }

    /// LD r,SPH / LD r,SPL
    pub(super) fn exec_ld_from_sp_nibble<B: Bus>(&mut self, bus: &mut B, high: bool, dst: Operand) {
        let value = if high {
            self.regs.sp >> 4
        } else {
            self.regs.sp & 0x0F
        };
        self.write_operand(bus, dst, value);
    }
}
