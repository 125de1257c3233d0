use crate::cpu::alu;
use crate::cpu::{Bus, Cpu, Flags, IndexPart, IndexReg, Operand};

impl Cpu {
    /// LD X,e / LD Y,e: load the low 8 bits, page unchanged.
    pub(super) fn exec_ld_index_imm(&mut self, reg: IndexReg, e: u8) {
        let page = self.regs.index(reg) & 0xF00;
        self.regs.set_index(reg, page | e as u16);
    }

    pub(super) fn exec_ld_index_part<B: Bus>(
        &mut self,
        bus: &mut B,
        reg: IndexReg,
        part: IndexPart,
        src: Operand,
    ) {
        let value = self.read_operand(bus, src);
        self.regs.set_index_part(reg, part, value);
    }

    pub(super) fn exec_ld_from_index_part<B: Bus>(
        &mut self,
        bus: &mut B,
        reg: IndexReg,
        part: IndexPart,
        dst: Operand,
    ) {
        let value = self.regs.index_part(reg, part);
        self.write_operand(bus, dst, value);
    }

    /// ADC XH/XL/YH/YL,i: binary add with carry, never decimal-adjusted.
    pub(super) fn exec_adc_index(&mut self, reg: IndexReg, part: IndexPart, imm: u8) {
        let result = alu::add(self.regs.index_part(reg, part), imm, self.carry(), false);
        self.regs.set_index_part(reg, part, result.value);
        self.regs.set_flag(Flags::C, result.carry);
        self.regs.set_flag(Flags::Z, result.zero());
    }

    pub(super) fn exec_cp_index(&mut self, reg: IndexReg, part: IndexPart, imm: u8) {
        let value = self.regs.index_part(reg, part);
        self.regs.set_flag(Flags::C, value < imm);
        self.regs.set_flag(Flags::Z, value == imm);
    }
}
