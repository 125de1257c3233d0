use super::r_q;
use crate::cpu::{Bus, Cpu, IndexReg};

impl Cpu {
    /// LD r,q
    pub(super) fn exec_ld_r_q<B: Bus>(&mut self, bus: &mut B, opcode: u16) {
        let (r, q) = r_q(opcode);
        let value = self.read_operand(bus, q);
        self.write_operand(bus, r, value);
    }

    /// LDPX MX,i / LDPY MY,i
    pub(super) fn exec_ldp_imm<B: Bus>(&mut self, bus: &mut B, reg: IndexReg, imm: u8) {
        self.write_indexed(bus, reg, imm);
        self.regs.post_increment(reg);
    }

    /// LDPX r,q / LDPY r,q: transfer, then advance the index register.
    pub(super) fn exec_ldp_r_q<B: Bus>(&mut self, bus: &mut B, reg: IndexReg, opcode: u16) {
        self.exec_ld_r_q(bus, opcode);
        self.regs.post_increment(reg);
    }
}
