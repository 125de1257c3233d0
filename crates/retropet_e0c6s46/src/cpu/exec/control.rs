use crate::cpu::{Bus, Cpu, PC_MASK};

impl Cpu {
    /// PSET p: latch bank/page for the next branch.
    pub(super) fn exec_pset(&mut self, opcode: u16) {
        self.regs.np = (opcode & 0x1F) as u8;
        self.pset_pending = true;
    }

    /// JP s and its conditional forms. The target bank/page comes from NP.
    pub(super) fn exec_jp(&mut self, opcode: u16, taken: bool) {
        if taken {
            self.next_pc = ((self.regs.np as u16) << 8) | (opcode & 0xFF);
        }
    }

    /// JPBA: jump to step B:A of the NP page.
    pub(super) fn exec_jpba(&mut self) {
        let step = ((self.regs.b as u16) << 4) | self.regs.a as u16;
        self.next_pc = ((self.regs.np as u16) << 8) | step;
    }

    /// CALL s / CALZ s. Calls stay in the current bank; CALZ always
    /// targets page 0.
    pub(super) fn exec_call<B: Bus>(&mut self, bus: &mut B, opcode: u16, zero_page: bool) {
        let ret = self.next_pc;
        self.push_pc(bus, ret);
        let page = if zero_page {
            0
        } else {
            self.regs.np_page() as u16
        };
        self.next_pc = (self.regs.pc & 0x1000) | (page << 8) | (opcode & 0xFF);
    }

    pub(super) fn exec_ret<B: Bus>(&mut self, bus: &mut B) {
        self.next_pc = self.pop_pc(bus);
    }

    /// RETS: return and skip the instruction after the call.
    pub(super) fn exec_rets<B: Bus>(&mut self, bus: &mut B) {
        let ret = self.pop_pc(bus);
        self.next_pc = (ret + 1) & PC_MASK;
    }

    /// RETD e: return and store `e` at M(X), M(X+1).
    pub(super) fn exec_retd<B: Bus>(&mut self, bus: &mut B, e: u8) {
        self.next_pc = self.pop_pc(bus);
        self.store_byte_at_x(bus, e);
    }
}
