use super::{Bus, Cpu, Flags, INTERRUPT_CYCLES};

impl Cpu {
    /// Whether an interrupt may be accepted at this instruction boundary.
    #[inline]
    pub fn interrupts_accepted(&self) -> bool {
        self.regs.flag(Flags::I) && !self.interrupt_hold && !self.in_reset
    }

    /// Service the highest-priority triggered interrupt, if any.
    ///
    /// Returns `Some(cycles)` if an interrupt was taken, or `None`
    /// otherwise. The return address is pushed as page, high and low
    /// nibbles; the handler runs at `bank:1:vector`.
    pub fn handle_interrupts<B: Bus>(&mut self, bus: &mut B) -> Option<u32> {
        if !self.interrupts_accepted() {
            return None;
        }
        let vector = bus.acknowledge_interrupt()?;

        let pc = self.regs.pc;
        self.push_pc(bus, pc);
        self.regs.set_flag(Flags::I, false);
        self.halted = false;

        let bank = pc & 0x1000;
        self.regs.pc = bank | 0x0100 | (vector as u16 & 0xFF);
        self.regs.np = self.regs.pc_np();

        log::debug!(
            "E0C6S46 interrupt: vector=0x{:02X} from pc=0x{:04X} sp=0x{:02X}",
            vector,
            pc,
            self.regs.sp
        );

        Some(INTERRUPT_CYCLES)
    }
}
