use crate::cpu::alu;
use crate::cpu::{Bus, Cpu, Flags, IndexReg, OpClass, Operand};

impl Cpu {
    /// Second operand of an `r,q` or `r,i` form.
    #[inline]
    fn source_value<B: Bus>(&mut self, bus: &mut B, q: Option<Operand>, imm: u8) -> u8 {
        match q {
            Some(q) => self.read_operand(bus, q),
            None => imm,
        }
    }

    /// ADD/ADC r,i and r,q.
    pub(super) fn exec_add<B: Bus>(
        &mut self,
        bus: &mut B,
        r: Operand,
        q: Option<Operand>,
        imm: u8,
        with_carry: bool,
    ) {
        let rhs = self.source_value(bus, q, imm);
        let lhs = self.read_operand(bus, r);
        let carry_in = with_carry && self.carry();
        let result = alu::add(lhs, rhs, carry_in, self.decimal());
        self.commit_alu(bus, r, result);
    }

    /// SUB r,q and SBC r,i / r,q.
    pub(super) fn exec_sub<B: Bus>(
        &mut self,
        bus: &mut B,
        r: Operand,
        q: Option<Operand>,
        imm: u8,
        with_borrow: bool,
    ) {
        let rhs = self.source_value(bus, q, imm);
        let lhs = self.read_operand(bus, r);
        let borrow_in = with_borrow && self.carry();
        let result = alu::sub(lhs, rhs, borrow_in, self.decimal());
        self.commit_alu(bus, r, result);
    }

    /// AND/OR/XOR: Z only, carry untouched.
    pub(super) fn exec_logic<B: Bus>(
        &mut self,
        bus: &mut B,
        class: OpClass,
        r: Operand,
        q: Option<Operand>,
        imm: u8,
    ) {
        let rhs = self.source_value(bus, q, imm);
        let lhs = self.read_operand(bus, r);
        let value = match class {
            OpClass::AndRI | OpClass::AndRQ => lhs & rhs,
            OpClass::OrRI | OpClass::OrRQ => lhs | rhs,
            _ => lhs ^ rhs,
        };
        self.write_operand(bus, r, value);
        self.regs.set_flag(Flags::Z, value & 0xF == 0);
    }

    /// NOT r
    pub(super) fn exec_not<B: Bus>(&mut self, bus: &mut B, r: Operand) {
        let value = !self.read_operand(bus, r) & 0xF;
        self.write_operand(bus, r, value);
        self.regs.set_flag(Flags::Z, value == 0);
    }

    /// CP: C when r < rhs, Z when equal. No register is written.
    pub(super) fn exec_cp<B: Bus>(&mut self, bus: &mut B, r: Operand, q: Option<Operand>, imm: u8) {
        let rhs = self.source_value(bus, q, imm);
        let lhs = self.read_operand(bus, r);
        self.regs.set_flag(Flags::C, lhs < rhs);
        self.regs.set_flag(Flags::Z, lhs == rhs);
    }

    /// FAN: Z from `r & rhs`. No register is written.
    pub(super) fn exec_fan<B: Bus>(
        &mut self,
        bus: &mut B,
        r: Operand,
        q: Option<Operand>,
        imm: u8,
    ) {
        let rhs = self.source_value(bus, q, imm);
        let lhs = self.read_operand(bus, r);
        self.regs.set_flag(Flags::Z, lhs & rhs == 0);
    }

    /// RLC r / RRC r: rotate through carry. Only C changes.
    pub(super) fn exec_rotate<B: Bus>(&mut self, bus: &mut B, r: Operand, left: bool) {
        let value = self.read_operand(bus, r);
        let result = if left {
            alu::rotate_left(value, self.carry())
        } else {
            alu::rotate_right(value, self.carry())
        };
        self.write_operand(bus, r, result.value);
        self.regs.set_flag(Flags::C, result.carry);
    }

    /// INC Mn / DEC Mn on the first 16 RAM nibbles. Binary only.
    pub(super) fn exec_inc_dec_mem<B: Bus>(&mut self, bus: &mut B, n: u8, increment: bool) {
        let addr = n as u16;
        let value = bus.read(addr) & 0xF;
        let result = if increment {
            alu::add(value, 1, false, false)
        } else {
            alu::sub(value, 1, false, false)
        };
        bus.write(addr, result.value);
        self.regs.set_flag(Flags::C, result.carry);
        self.regs.set_flag(Flags::Z, result.zero());
    }

    /// ACPX/ACPY/SCPX/SCPY: M(X|Y) +/- r with carry, decimal-aware, then
    /// advance the index register.
    pub(super) fn exec_block_arith<B: Bus>(
        &mut self,
        bus: &mut B,
        reg: IndexReg,
        r: Operand,
        add: bool,
    ) {
        let rhs = self.read_operand(bus, r);
        let lhs = self.read_indexed(bus, reg);
        let result = if add {
            alu::add(lhs, rhs, self.carry(), self.decimal())
        } else {
            alu::sub(lhs, rhs, self.carry(), self.decimal())
        };
        self.write_indexed(bus, reg, result.value);
        self.regs.set_flag(Flags::C, result.carry);
        self.regs.set_flag(Flags::Z, result.zero());
        self.regs.post_increment(reg);
    }
}
