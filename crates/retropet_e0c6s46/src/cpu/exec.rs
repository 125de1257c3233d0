mod arith;
mod control;
mod index;
mod ld;
mod stack;
mod system;

use super::{Bus, Cpu, IndexPart, IndexReg, OpClass, Operand};

/// 8-bit immediate (`s`, `e`, `l`).
#[inline]
fn imm8(opcode: u16) -> u8 {
    (opcode & 0xFF) as u8
}

/// 4-bit immediate (`i`, `n`, `p` low bits).
#[inline]
fn imm4(opcode: u16) -> u8 {
    (opcode & 0xF) as u8
}

/// `r` field of the `r,i` forms (bits 5..4).
#[inline]
fn r_of_ri(opcode: u16) -> Operand {
    Operand::from_bits(opcode >> 4)
}

/// `r` and `q` fields of the `r,q` forms (bits 3..2 and 1..0).
#[inline]
fn r_q(opcode: u16) -> (Operand, Operand) {
    (Operand::from_bits(opcode >> 2), Operand::from_bits(opcode))
}

/// Lone `r` field in bits 1..0.
#[inline]
fn r_low(opcode: u16) -> Operand {
    Operand::from_bits(opcode)
}

impl Cpu {
    /// Execute one decoded instruction.
    ///
    /// Handlers that redirect control flow overwrite `next_pc`; cycle
    /// costs come from `OpClass::cycles`.
    pub(super) fn exec_opcode<B: Bus>(&mut self, bus: &mut B, class: OpClass, opcode: u16) {
        use IndexPart::{High, Low, Page};
        use IndexReg::{X, Y};

        match class {
            // Branches.
            OpClass::Pset => self.exec_pset(opcode),
            OpClass::Jp => self.exec_jp(opcode, true),
            OpClass::JpC => self.exec_jp(opcode, self.carry()),
            OpClass::JpNc => self.exec_jp(opcode, !self.carry()),
            OpClass::JpZ => self.exec_jp(opcode, self.zero()),
            OpClass::JpNz => self.exec_jp(opcode, !self.zero()),
            OpClass::Jpba => self.exec_jpba(),
            OpClass::Call => self.exec_call(bus, opcode, false),
            OpClass::Calz => self.exec_call(bus, opcode, true),
            OpClass::Ret => self.exec_ret(bus),
            OpClass::Rets => self.exec_rets(bus),
            OpClass::Retd => self.exec_retd(bus, imm8(opcode)),

            // System.
            OpClass::Nop5 | OpClass::Nop7 => {}
            OpClass::Halt | OpClass::Slp => self.exec_halt(class),
            OpClass::Undefined => self.exec_undefined(opcode),

            // Index registers.
            OpClass::IncX => self.regs.post_increment(X),
            OpClass::IncY => self.regs.post_increment(Y),
            OpClass::LdX => self.exec_ld_index_imm(X, imm8(opcode)),
            OpClass::LdY => self.exec_ld_index_imm(Y, imm8(opcode)),
            OpClass::LdXpR => self.exec_ld_index_part(bus, X, Page, r_low(opcode)),
            OpClass::LdXhR => self.exec_ld_index_part(bus, X, High, r_low(opcode)),
            OpClass::LdXlR => self.exec_ld_index_part(bus, X, Low, r_low(opcode)),
            OpClass::LdYpR => self.exec_ld_index_part(bus, Y, Page, r_low(opcode)),
            OpClass::LdYhR => self.exec_ld_index_part(bus, Y, High, r_low(opcode)),
            OpClass::LdYlR => self.exec_ld_index_part(bus, Y, Low, r_low(opcode)),
            OpClass::LdRXp => self.exec_ld_from_index_part(bus, X, Page, r_low(opcode)),
            OpClass::LdRXh => self.exec_ld_from_index_part(bus, X, High, r_low(opcode)),
            OpClass::LdRXl => self.exec_ld_from_index_part(bus, X, Low, r_low(opcode)),
            OpClass::LdRYp => self.exec_ld_from_index_part(bus, Y, Page, r_low(opcode)),
            OpClass::LdRYh => self.exec_ld_from_index_part(bus, Y, High, r_low(opcode)),
            OpClass::LdRYl => self.exec_ld_from_index_part(bus, Y, Low, r_low(opcode)),
            OpClass::AdcXh => self.exec_adc_index(X, High, imm4(opcode)),
            OpClass::AdcXl => self.exec_adc_index(X, Low, imm4(opcode)),
            OpClass::AdcYh => self.exec_adc_index(Y, High, imm4(opcode)),
            OpClass::AdcYl => self.exec_adc_index(Y, Low, imm4(opcode)),
            OpClass::CpXh => self.exec_cp_index(X, High, imm4(opcode)),
            OpClass::CpXl => self.exec_cp_index(X, Low, imm4(opcode)),
            OpClass::CpYh => self.exec_cp_index(Y, High, imm4(opcode)),
            OpClass::CpYl => self.exec_cp_index(Y, Low, imm4(opcode)),

            // Data transfer.
            OpClass::LdRI => self.write_operand(bus, r_of_ri(opcode), imm4(opcode)),
            OpClass::LdRQ => self.exec_ld_r_q(bus, opcode),
            OpClass::LdAMn => self.regs.a = bus.read(imm4(opcode) as u16) & 0xF,
            OpClass::LdBMn => self.regs.b = bus.read(imm4(opcode) as u16) & 0xF,
            OpClass::LdMnA => bus.write(imm4(opcode) as u16, self.regs.a),
            OpClass::LdMnB => bus.write(imm4(opcode) as u16, self.regs.b),
            OpClass::LdpxMx => self.exec_ldp_imm(bus, X, imm4(opcode)),
            OpClass::LdpyMy => self.exec_ldp_imm(bus, Y, imm4(opcode)),
            OpClass::LdpxRQ => self.exec_ldp_r_q(bus, X, opcode),
            OpClass::LdpyRQ => self.exec_ldp_r_q(bus, Y, opcode),
            OpClass::Lbpx => self.store_byte_at_x(bus, imm8(opcode)),

            // Flags.
            OpClass::Set => self.exec_set_flags(imm4(opcode)),
            OpClass::Rst => self.exec_reset_flags(imm4(opcode)),

            // Stack.
            OpClass::IncSp => self.regs.sp = self.regs.sp.wrapping_add(1),
            OpClass::DecSp => self.regs.sp = self.regs.sp.wrapping_sub(1),
            OpClass::PushR => self.exec_push_r(bus, r_low(opcode)),
            OpClass::PushXp => self.exec_push_index_part(bus, X, Page),
            OpClass::PushXh => self.exec_push_index_part(bus, X, High),
            OpClass::PushXl => self.exec_push_index_part(bus, X, Low),
            OpClass::PushYp => self.exec_push_index_part(bus, Y, Page),
            OpClass::PushYh => self.exec_push_index_part(bus, Y, High),
            OpClass::PushYl => self.exec_push_index_part(bus, Y, Low),
            OpClass::PushF => self.exec_push_flags(bus),
            OpClass::PopR => self.exec_pop_r(bus, r_low(opcode)),
            OpClass::PopXp => self.exec_pop_index_part(bus, X, Page),
            OpClass::PopXh => self.exec_pop_index_part(bus, X, High),
            OpClass::PopXl => self.exec_pop_index_part(bus, X, Low),
            OpClass::PopYp => self.exec_pop_index_part(bus, Y, Page),
            OpClass::PopYh => self.exec_pop_index_part(bus, Y, High),
            OpClass::PopYl => self.exec_pop_index_part(bus, Y, Low),
            OpClass::PopF => self.exec_pop_flags(bus),
            OpClass::LdSphR => self.exec_ld_sp_nibble(bus, true, r_low(opcode)),
            OpClass::LdSplR => self.exec_ld_sp_nibble(bus, false, r_low(opcode)),
            OpClass::LdRSph => self.exec_ld_from_sp_nibble(bus, true, r_low(opcode)),
            OpClass::LdRSpl => self.exec_ld_from_sp_nibble(bus, false, r_low(opcode)),

            // Arithmetic and logic.
            OpClass::AddRI => self.exec_add(bus, r_of_ri(opcode), None, imm4(opcode), false),
            OpClass::AdcRI => self.exec_add(bus, r_of_ri(opcode), None, imm4(opcode), true),
            OpClass::SbcRI => self.exec_sub(bus, r_of_ri(opcode), None, imm4(opcode), true),
            OpClass::AddRQ | OpClass::AdcRQ | OpClass::SubRQ | OpClass::SbcRQ => {
                let (r, q) = r_q(opcode);
                match class {
                    OpClass::AddRQ => self.exec_add(bus, r, Some(q), 0, false),
                    OpClass::AdcRQ => self.exec_add(bus, r, Some(q), 0, true),
                    OpClass::SubRQ => self.exec_sub(bus, r, Some(q), 0, false),
                    _ => self.exec_sub(bus, r, Some(q), 0, true),
                }
            }
            OpClass::AndRI | OpClass::OrRI | OpClass::XorRI => {
                self.exec_logic(bus, class, r_of_ri(opcode), None, imm4(opcode))
            }
            OpClass::AndRQ | OpClass::OrRQ | OpClass::XorRQ => {
                let (r, q) = r_q(opcode);
                self.exec_logic(bus, class, r, Some(q), 0)
            }
            OpClass::CpRI => self.exec_cp(bus, r_of_ri(opcode), None, imm4(opcode)),
            OpClass::CpRQ => {
                let (r, q) = r_q(opcode);
                self.exec_cp(bus, r, Some(q), 0)
            }
            OpClass::FanRI => self.exec_fan(bus, r_of_ri(opcode), None, imm4(opcode)),
            OpClass::FanRQ => {
                let (r, q) = r_q(opcode);
                self.exec_fan(bus, r, Some(q), 0)
            }
            OpClass::Rlc => self.exec_rotate(bus, r_low(opcode), true),
            OpClass::Rrc => self.exec_rotate(bus, r_low(opcode), false),
            OpClass::IncMn => self.exec_inc_dec_mem(bus, imm4(opcode), true),
            OpClass::DecMn => self.exec_inc_dec_mem(bus, imm4(opcode), false),
            OpClass::Acpx => self.exec_block_arith(bus, X, r_low(opcode), true),
            OpClass::Acpy => self.exec_block_arith(bus, Y, r_low(opcode), true),
            OpClass::Scpx => self.exec_block_arith(bus, X, r_low(opcode), false),
            OpClass::Scpy => self.exec_block_arith(bus, Y, r_low(opcode), false),
            OpClass::Not => self.exec_not(bus, r_of_ri(opcode)),
        }
    }
}
