use super::alu;
use super::decode::{decode, OpClass, OPCODE_COUNT, OPCODE_RANGES};
use super::*;

/// Flat nibble memory plus a word-addressed program for CPU-only tests.
struct TestBus {
    memory: [u8; 0x1000],
    rom: Vec<u16>,
    pending: Vec<u8>,
}

impl TestBus {
    fn new() -> Self {
        Self {
            memory: [0; 0x1000],
            rom: vec![0xFFB; 0x2000],
            pending: Vec::new(),
        }
    }

    fn with_program(start: u16, program: &[u16]) -> Self {
        let mut bus = Self::new();
        bus.load(start, program);
        bus
    }

    fn load(&mut self, start: u16, program: &[u16]) {
        for (i, &op) in program.iter().enumerate() {
            self.rom[start as usize + i] = op;
        }
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[(addr & 0xFFF) as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.memory[(addr & 0xFFF) as usize] = value & 0xF;
    }

    fn fetch(&mut self, pc: u16) -> u16 {
        self.rom[(pc & PC_MASK) as usize]
    }

    fn acknowledge_interrupt(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

fn run(cpu: &mut Cpu, bus: &mut TestBus, steps: usize) -> u32 {
    (0..steps).map(|_| cpu.step(bus)).sum()
}

/// Independent first-match decoder written as (pattern, mask) pairs in the
/// layout of the instruction-set manual.
fn reference_decode(opcode: u16) -> OpClass {
    use OpClass::*;
    const PATTERNS: &[(u16, u16, OpClass)] = &[
        (0xE40, 0xFE0, Pset),
        (0x000, 0xF00, Jp),
        (0x200, 0xF00, JpC),
        (0x300, 0xF00, JpNc),
        (0x600, 0xF00, JpZ),
        (0x700, 0xF00, JpNz),
        (0xFE8, 0xFFF, Jpba),
        (0x400, 0xF00, Call),
        (0x500, 0xF00, Calz),
        (0xFDF, 0xFFF, Ret),
        (0xFDE, 0xFFF, Rets),
        (0x100, 0xF00, Retd),
        (0xFFB, 0xFFF, Nop5),
        (0xFFF, 0xFFF, Nop7),
        (0xFF8, 0xFFF, Halt),
        (0xFF9, 0xFFF, Slp),
        (0xEE0, 0xFFF, IncX),
        (0xEF0, 0xFFF, IncY),
        (0xB00, 0xF00, LdX),
        (0x800, 0xF00, LdY),
        (0xE80, 0xFFC, LdXpR),
        (0xE84, 0xFFC, LdXhR),
        (0xE88, 0xFFC, LdXlR),
        (0xE90, 0xFFC, LdYpR),
        (0xE94, 0xFFC, LdYhR),
        (0xE98, 0xFFC, LdYlR),
        (0xEA0, 0xFFC, LdRXp),
        (0xEA4, 0xFFC, LdRXh),
        (0xEA8, 0xFFC, LdRXl),
        (0xEB0, 0xFFC, LdRYp),
        (0xEB4, 0xFFC, LdRYh),
        (0xEB8, 0xFFC, LdRYl),
        (0xA00, 0xFF0, AdcXh),
        (0xA10, 0xFF0, AdcXl),
        (0xA20, 0xFF0, AdcYh),
        (0xA30, 0xFF0, AdcYl),
        (0xA40, 0xFF0, CpXh),
        (0xA50, 0xFF0, CpXl),
        (0xA60, 0xFF0, CpYh),
        (0xA70, 0xFF0, CpYl),
        (0xE00, 0xFC0, LdRI),
        (0xEC0, 0xFF0, LdRQ),
        (0xFA0, 0xFF0, LdAMn),
        (0xFB0, 0xFF0, LdBMn),
        (0xF80, 0xFF0, LdMnA),
        (0xF90, 0xFF0, LdMnB),
        (0xE60, 0xFF0, LdpxMx),
        (0xEE0, 0xFF0, LdpxRQ),
        (0xE70, 0xFF0, LdpyMy),
        (0xEF0, 0xFF0, LdpyRQ),
        (0x900, 0xF00, Lbpx),
        (0xF40, 0xFF0, Set),
        (0xF50, 0xFF0, Rst),
        (0xFDB, 0xFFF, IncSp),
        (0xFCB, 0xFFF, DecSp),
        (0xFC0, 0xFFC, PushR),
        (0xFC4, 0xFFF, PushXp),
        (0xFC5, 0xFFF, PushXh),
        (0xFC6, 0xFFF, PushXl),
        (0xFC7, 0xFFF, PushYp),
        (0xFC8, 0xFFF, PushYh),
        (0xFC9, 0xFFF, PushYl),
        (0xFCA, 0xFFF, PushF),
        (0xFD0, 0xFFC, PopR),
        (0xFD4, 0xFFF, PopXp),
        (0xFD5, 0xFFF, PopXh),
        (0xFD6, 0xFFF, PopXl),
        (0xFD7, 0xFFF, PopYp),
        (0xFD8, 0xFFF, PopYh),
        (0xFD9, 0xFFF, PopYl),
        (0xFDA, 0xFFF, PopF),
        (0xFE0, 0xFFC, LdSphR),
        (0xFF0, 0xFFC, LdSplR),
        (0xFE4, 0xFFC, LdRSph),
        (0xFF4, 0xFFC, LdRSpl),
        (0xC00, 0xFC0, AddRI),
        (0xA80, 0xFF0, AddRQ),
        (0xC40, 0xFC0, AdcRI),
        (0xA90, 0xFF0, AdcRQ),
        (0xAA0, 0xFF0, SubRQ),
        (0xD40, 0xFC0, SbcRI),
        (0xAB0, 0xFF0, SbcRQ),
        (0xC80, 0xFC0, AndRI),
        (0xAC0, 0xFF0, AndRQ),
        (0xCC0, 0xFC0, OrRI),
        (0xAD0, 0xFF0, OrRQ),
        (0xD0F, 0xFCF, Not),
        (0xD00, 0xFC0, XorRI),
        (0xAE0, 0xFF0, XorRQ),
        (0xDC0, 0xFC0, CpRI),
        (0xF00, 0xFF0, CpRQ),
        (0xD80, 0xFC0, FanRI),
        (0xF10, 0xFF0, FanRQ),
        (0xAF0, 0xFF0, Rlc),
        (0xE8C, 0xFFC, Rrc),
        (0xF60, 0xFF0, IncMn),
        (0xF70, 0xFF0, DecMn),
        (0xF28, 0xFFC, Acpx),
        (0xF2C, 0xFFC, Acpy),
        (0xF38, 0xFFC, Scpx),
        (0xF3C, 0xFFC, Scpy),
    ];

    PATTERNS
        .iter()
        .find(|(pattern, mask, _)| opcode & mask == *pattern)
        .map(|&(_, _, class)| class)
        .unwrap_or(Undefined)
}

#[test]
fn dispatch_table_matches_instruction_manual_for_every_opcode() {
    for opcode in 0..OPCODE_COUNT as u16 {
        assert_eq!(
            decode(opcode),
            reference_decode(opcode),
            "opcode 0x{:03X} misrouted",
            opcode
        );
    }
}

#[test]
fn base_opcode_ranges_do_not_overlap() {
    let mut owner: Vec<Option<usize>> = vec![None; OPCODE_COUNT];
    for (i, range) in OPCODE_RANGES.iter().enumerate().filter(|(_, r)| !r.alias) {
        assert!(range.first <= range.last);
        for opcode in range.first..=range.last {
            if let Some(prev) = owner[opcode as usize] {
                panic!(
                    "opcode 0x{:03X} claimed by {:?} and {:?}",
                    opcode, OPCODE_RANGES[prev].class, range.class
                );
            }
            owner[opcode as usize] = Some(i);
        }
    }
}

#[test]
fn range_edges_route_to_neighbouring_classes() {
    // Edges of adjacent 4-wide rows are where a shifted boundary would hide.
    assert_eq!(decode(0xE83), OpClass::LdXpR);
    assert_eq!(decode(0xE84), OpClass::LdXhR);
    assert_eq!(decode(0xE8B), OpClass::LdXlR);
    assert_eq!(decode(0xE8C), OpClass::Rrc);
    assert_eq!(decode(0xE9C), OpClass::Undefined);
    assert_eq!(decode(0xEAB), OpClass::LdRXl);
    assert_eq!(decode(0xEAC), OpClass::Undefined);
    assert_eq!(decode(0xFE7), OpClass::LdRSph);
    assert_eq!(decode(0xFE8), OpClass::Jpba);
    assert_eq!(decode(0xFE9), OpClass::Undefined);
    assert_eq!(decode(0xEE1), OpClass::LdpxRQ);
    assert_eq!(decode(0xD3F), OpClass::Not);
    assert_eq!(decode(0xD4F), OpClass::SbcRI);
}

#[test]
fn decimal_addition_matches_manual_bcd_for_all_pairs() {
    for a in 0..16u8 {
        for b in 0..16u8 {
            for carry in [false, true] {
                let sum = a + b + carry as u8;
                let result = alu::add(a, b, carry, true);
                if sum >= 10 {
                    assert_eq!(result.value, (sum - 10) & 0xF, "{a}+{b}+{carry}");
                    assert!(result.carry);
                } else {
                    assert_eq!(result.value, sum);
                    assert!(!result.carry);
                }
                if a <= 9 && b <= 9 {
                    let decimal = result.carry as u8 * 10 + result.value;
                    assert_eq!(decimal, sum, "{a}+{b}+{carry} is not a valid BCD sum");
                }
            }
        }
    }
    let example = alu::add(0x9, 0x2, false, true);
    assert_eq!((example.value, example.carry), (0x1, true));
}

#[test]
fn decimal_subtraction_matches_manual_bcd_for_all_pairs() {
    for a in 0..16u8 {
        for b in 0..16u8 {
            for borrow in [false, true] {
                let diff = a as i16 - b as i16 - borrow as i16;
                let result = alu::sub(a, b, borrow, true);
                if diff < 0 {
                    assert_eq!(result.value as i16, (diff + 10) & 0xF, "{a}-{b}-{borrow}");
                    assert!(result.carry);
                } else {
                    assert_eq!(result.value as i16, diff);
                    assert!(!result.carry);
                }
                if a <= 9 && b <= 9 {
                    let signed = result.value as i16 - result.carry as i16 * 10;
                    assert_eq!(signed, diff, "{a}-{b}-{borrow} is not a valid BCD difference");
                }
            }
        }
    }
}

#[test]
fn binary_add_sets_carry_and_zero() {
    // LD A,#9 ; ADD A,#7
    let mut bus = TestBus::with_program(0x100, &[0xE09, 0xC07]);
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0x0);
    assert!(cpu.regs.flag(Flags::C));
    assert!(cpu.regs.flag(Flags::Z));
}

#[test]
fn decimal_add_through_register_operands() {
    // SET F,#4 (D) ; LD A,#9 ; LD B,#2 ; ADD A,B
    let mut bus = TestBus::with_program(0x100, &[0xF44, 0xE09, 0xE12, 0xA81]);
    let mut cpu = Cpu::new();
    let cycles = run(&mut cpu, &mut bus, 4);
    assert_eq!(cpu.regs.a, 0x1);
    assert!(cpu.regs.flag(Flags::C));
    assert!(!cpu.regs.flag(Flags::Z));
    assert_eq!(cycles, 7 + 5 + 5 + 7);
}

#[test]
fn operand_sources_reach_memory_through_index_registers() {
    // LD X,#0x20 ; LD Y,#0x30 ; LD MX,#5 (LD r,i r=2) ; LD MY,MX
    let mut bus = TestBus::with_program(0x100, &[0xB20, 0x830, 0xE25, 0xECE]);
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 4);
    assert_eq!(bus.memory[0x020], 5);
    assert_eq!(bus.memory[0x030], 5);
}

#[test]
fn ldpx_post_increment_wraps_within_page() {
    // LD XP,A with A=2 ; LD X,#0xFF ; LDPX MX,#7
    let mut bus = TestBus::with_program(0x100, &[0xE02, 0xE80, 0xBFF, 0xE67]);
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 4);
    assert_eq!(bus.memory[0x2FF], 7);
    assert_eq!(cpu.regs.x, 0x200);
}

#[test]
fn pset_redirects_the_following_jump_only() {
    // PSET #0x03 ; JP #0x40
    let mut bus = TestBus::with_program(0x100, &[0xE43, 0x040]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.np, 0x03);
    assert_eq!(cpu.regs.pc, 0x101);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x340);
    assert_eq!(cpu.regs.np, 0x03);

    // Without PSET, a jump stays in the current page.
    bus.load(0x340, &[0x010]);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x310);
}

#[test]
fn call_and_ret_round_trip_through_stack() {
    // PSET #2 ; CALL #0x10
    let mut bus = TestBus::with_program(0x100, &[0xE42, 0x410]);
    bus.load(0x210, &[0xFDF]);
    let mut cpu = Cpu::new();
    cpu.regs.sp = 0x40;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.pc, 0x210);
    assert_eq!(cpu.regs.sp, 0x3D);
    // Return address 0x102 stored page, high, low at descending addresses.
    assert_eq!(bus.memory[0x3F], 0x1);
    assert_eq!(bus.memory[0x3E], 0x0);
    assert_eq!(bus.memory[0x3D], 0x2);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x102);
    assert_eq!(cpu.regs.sp, 0x40);
}

#[test]
fn calz_targets_page_zero_and_rets_skips() {
    let mut bus = TestBus::with_program(0x100, &[0x520]);
    bus.load(0x020, &[0xFDE]);
    let mut cpu = Cpu::new();
    cpu.regs.sp = 0x10;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x020);
    let cycles = cpu.step(&mut bus);
    assert_eq!(cycles, 12);
    assert_eq!(cpu.regs.pc, 0x102);
}

#[test]
fn retd_stores_immediate_at_x() {
    // LD X,#0x50 ; CALL #0x10 ; (0x110) RETD #0xA7
    let mut bus = TestBus::with_program(0x100, &[0xB50, 0x410]);
    bus.load(0x110, &[0x1A7]);
    let mut cpu = Cpu::new();
    cpu.regs.sp = 0x80;
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.pc, 0x102);
    assert_eq!(bus.memory[0x050], 0x7);
    assert_eq!(bus.memory[0x051], 0xA);
    assert_eq!(cpu.regs.x, 0x052);
}

#[test]
fn jpba_uses_accumulators_as_step() {
    // LD A,#4 ; LD B,#0xC ; PSET #5 ; JPBA
    let mut bus = TestBus::with_program(0x100, &[0xE04, 0xE1C, 0xE45, 0xFE8]);
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 4);
    assert_eq!(cpu.regs.pc, 0x5C4);
}

#[test]
fn push_pop_and_stack_pointer_wrap() {
    // LD A,#0xB ; PUSH A ; POP B
    let mut bus = TestBus::with_program(0x100, &[0xE0B, 0xFC0, 0xFD1]);
    let mut cpu = Cpu::new();
    cpu.regs.sp = 0x00;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.sp, 0xFF);
    assert_eq!(bus.memory[0x0FF], 0xB);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.b, 0xB);
    assert_eq!(cpu.regs.sp, 0x00);
}

#[test]
fn rotate_changes_only_carry() {
    // SET F,#3 (C,Z) ; LD A,#8 ; RLC A
    let mut bus = TestBus::with_program(0x100, &[0xF43, 0xE08, 0xAF0]);
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.a, 0x1);
    assert!(cpu.regs.flag(Flags::C));
    assert!(cpu.regs.flag(Flags::Z));
}

#[test]
fn compare_and_fan_leave_operands_untouched() {
    // LD A,#3 ; CP A,#5 ; FAN A,#4
    let mut bus = TestBus::with_program(0x100, &[0xE03, 0xDC5, 0xD84]);
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 2);
    assert!(cpu.regs.flag(Flags::C));
    assert!(!cpu.regs.flag(Flags::Z));
    cpu.step(&mut bus);
    assert!(cpu.regs.flag(Flags::Z));
    assert!(cpu.regs.flag(Flags::C));
    assert_eq!(cpu.regs.a, 3);
}

#[test]
fn acpx_adds_with_carry_and_advances_x() {
    // SET F,#5 (D,C) ; LD X,#0x10 ; LD A,#4 ; ACPX MX,A
    let mut bus = TestBus::with_program(0x100, &[0xF45, 0xB10, 0xE04, 0xF28]);
    bus.memory[0x10] = 0x6;
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 4);
    // 6 + 4 + 1 = 11 -> 1 with carry in decimal mode.
    assert_eq!(bus.memory[0x10], 0x1);
    assert!(cpu.regs.flag(Flags::C));
    assert_eq!(cpu.regs.x, 0x11);
}

#[test]
fn not_is_an_alias_of_xor_with_all_ones() {
    let mut bus = TestBus::with_program(0x100, &[0xE05, 0xD0F]);
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0xA);
    assert_eq!(decode(0xD0F).cycles(), 7);
}

#[test]
fn undefined_opcode_is_a_counted_five_cycle_nop() {
    let mut bus = TestBus::with_program(0x100, &[0xFFA]);
    let mut cpu = Cpu::new();
    let before = cpu.regs;
    assert_eq!(cpu.step(&mut bus), 5);
    assert_eq!(cpu.undefined_opcodes(), 1);
    assert_eq!(cpu.regs.pc, 0x101);
    assert_eq!(cpu.regs.a, before.a);
    assert_eq!(cpu.regs.flags, before.flags);
}

#[test]
fn enabling_interrupts_holds_for_one_instruction() {
    // SET F,#8 (EI) ; NOP5
    let mut bus = TestBus::with_program(0x100, &[0xF48, 0xFFB]);
    bus.pending.push(0x04);
    let mut cpu = Cpu::new();
    cpu.regs.sp = 0x40;
    cpu.step(&mut bus);
    assert_eq!(cpu.handle_interrupts(&mut bus), None);
    cpu.step(&mut bus);
    assert_eq!(cpu.handle_interrupts(&mut bus), Some(INTERRUPT_CYCLES));
    assert_eq!(cpu.regs.pc, 0x104);
    assert!(!cpu.regs.flag(Flags::I));
    // Return address 0x102 was pushed.
    assert_eq!(bus.memory[0x3D], 0x2);
}

#[test]
fn pop_f_holds_interrupts_for_one_instruction() {
    // LD A,#8 ; PUSH A ; POP F ; NOP5
    let mut bus = TestBus::with_program(0x100, &[0xE08, 0xFC0, 0xFDA, 0xFFB]);
    let mut cpu = Cpu::new();
    cpu.regs.sp = 0x40;
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    bus.pending.push(0x0C);
    cpu.step(&mut bus);
    assert!(cpu.regs.flag(Flags::I));
    assert_eq!(cpu.handle_interrupts(&mut bus), None);
    cpu.step(&mut bus);
    assert_eq!(cpu.handle_interrupts(&mut bus), Some(INTERRUPT_CYCLES));
    assert_eq!(cpu.regs.pc, 0x10C);
}

#[test]
fn pset_holds_interrupts_until_the_branch_completes() {
    let mut bus = TestBus::with_program(0x100, &[0xFFB, 0xE43, 0x000]);
    let mut cpu = Cpu::new();
    cpu.regs.flags = Flags::I;
    cpu.regs.sp = 0x40;
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    bus.pending.push(0x0C);
    assert_eq!(cpu.handle_interrupts(&mut bus), None);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x300);
    assert!(cpu.handle_interrupts(&mut bus).is_some());
    assert_eq!(cpu.regs.pc, 0x10C);
    assert_eq!(cpu.regs.np, 0x01);
}

#[test]
fn interrupt_wakes_halted_core_and_keeps_bank() {
    let mut bus = TestBus::new();
    let mut cpu = Cpu::new();
    cpu.regs.pc = 0x1234;
    cpu.regs.flags = Flags::I;
    cpu.halted = true;
    bus.pending.push(0x06);
    assert!(cpu.handle_interrupts(&mut bus).is_some());
    assert!(!cpu.halted);
    assert_eq!(cpu.regs.pc, 0x1106);
    assert_eq!(cpu.regs.np, 0x11);
}

#[test]
fn reset_restores_documented_power_on_state() {
    let mut bus = TestBus::with_program(0x100, &[0xE0F, 0xB44, 0xF4F]);
    let mut cpu = Cpu::new();
    run(&mut cpu, &mut bus, 3);
    cpu.reset();
    let once = cpu.regs;
    cpu.reset();
    assert_eq!(cpu.regs, once);
    assert_eq!(cpu.regs.pc, Cpu::RESET_PC);
    assert_eq!(cpu.regs.np, Cpu::RESET_NP);
    assert_eq!(cpu.regs.a, 0);
    assert_eq!(cpu.regs.x, 0);
    assert!(cpu.regs.flags.is_empty());
    assert!(!cpu.halted);
}
