use super::alu::AluResult;
use super::{Bus, Cpu, Flags, IndexReg, Operand};

impl Cpu {
    /// Read one of the four interchangeable operand sources.
    #[inline]
    pub(super) fn read_operand<B: Bus>(&mut self, bus: &mut B, operand: Operand) -> u8 {
        match operand {
            Operand::A => self.regs.a,
            Operand::B => self.regs.b,
            Operand::MX => bus.read(self.regs.x) & 0xF,
            Operand::MY => bus.read(self.regs.y) & 0xF,
        }
    }

    /// Write one of the four interchangeable operand sources.
    #[inline]
    pub(super) fn write_operand<B: Bus>(&mut self, bus: &mut B, operand: Operand, value: u8) {
        let value = value & 0xF;
        match operand {
            Operand::A => self.regs.a = value,
            Operand::B => self.regs.b = value,
            Operand::MX => bus.write(self.regs.x, value),
            Operand::MY => bus.write(self.regs.y, value),
        }
    }

    #[inline]
    pub(super) fn read_indexed<B: Bus>(&mut self, bus: &mut B, reg: IndexReg) -> u8 {
        bus.read(self.regs.index(reg)) & 0xF
    }

    #[inline]
    pub(super) fn write_indexed<B: Bus>(&mut self, bus: &mut B, reg: IndexReg, value: u8) {
        bus.write(self.regs.index(reg), value & 0xF);
    }

    /// Store `e` at M(X) and M(X+1), low nibble first, leaving X two past.
    pub(super) fn store_byte_at_x<B: Bus>(&mut self, bus: &mut B, e: u8) {
        self.write_indexed(bus, IndexReg::X, e & 0xF);
        self.regs.post_increment(IndexReg::X);
        self.write_indexed(bus, IndexReg::X, e >> 4);
        self.regs.post_increment(IndexReg::X);
    }

    #[inline]
    pub(super) fn push_nibble<B: Bus>(&mut self, bus: &mut B, value: u8) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp as u16, value & 0xF);
    }

    #[inline]
    pub(super) fn pop_nibble<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.sp as u16) & 0xF;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        value
    }

    /// Push a 13-bit return address as page, high and low nibbles.
    ///
    /// The bank bit is not stored; returns stay in the current bank.
    pub(super) fn push_pc<B: Bus>(&mut self, bus: &mut B, pc: u16) {
        self.push_nibble(bus, ((pc >> 8) & 0xF) as u8);
        self.push_nibble(bus, ((pc >> 4) & 0xF) as u8);
        self.push_nibble(bus, (pc & 0xF) as u8);
    }

    pub(super) fn pop_pc<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let low = self.pop_nibble(bus) as u16;
        let high = self.pop_nibble(bus) as u16;
        let page = self.pop_nibble(bus) as u16;
        (self.regs.pc & 0x1000) | (page << 8) | (high << 4) | low
    }

    /// Apply an ALU result: store it and update C and Z.
    #[inline]
    pub(super) fn commit_alu<B: Bus>(&mut self, bus: &mut B, dst: Operand, result: AluResult) {
        self.write_operand(bus, dst, result.value);
        self.regs.set_flag(Flags::C, result.carry);
        self.regs.set_flag(Flags::Z, result.zero());
    }

    #[inline]
    pub(super) fn decimal(&self) -> bool {
        self.regs.flag(Flags::D)
    }

    #[inline]
    pub(super) fn carry(&self) -> bool {
        self.regs.flag(Flags::C)
    }

    #[inline]
    pub(super) fn zero(&self) -> bool {
        self.regs.flag(Flags::Z)
    }
}
