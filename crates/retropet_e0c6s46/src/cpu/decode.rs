use lazy_static::lazy_static;

/// Number of distinct 12-bit instruction words.
pub const OPCODE_COUNT: usize = 4096;

/// Instruction class of a 12-bit opcode.
///
/// Each variant names one row of the E0C6200 instruction table. Operand
/// fields (immediates, register selectors) are extracted from the opcode by
/// the executor; the class alone decides which handler runs and how many
/// clock cycles it costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpClass {
    // Branches.
    Pset,
    Jp,
    JpC,
    JpNc,
    JpZ,
    JpNz,
    Jpba,
    Call,
    Calz,
    Ret,
    Rets,
    Retd,

    // System.
    Nop5,
    Nop7,
    Halt,
    Slp,

    // Index registers.
    IncX,
    IncY,
    LdX,
    LdY,
    LdXpR,
    LdXhR,
    LdXlR,
    LdYpR,
    LdYhR,
    LdYlR,
    LdRXp,
    LdRXh,
    LdRXl,
    LdRYp,
    LdRYh,
    LdRYl,
    AdcXh,
    AdcXl,
    AdcYh,
    AdcYl,
    CpXh,
    CpXl,
    CpYh,
    CpYl,

    // Data transfer.
    LdRI,
    LdRQ,
    LdAMn,
    LdBMn,
    LdMnA,
    LdMnB,
    LdpxMx,
    LdpxRQ,
    LdpyMy,
    LdpyRQ,
    Lbpx,

    // Flags.
    Set,
    Rst,

    // Stack.
    IncSp,
    DecSp,
    PushR,
    PushXp,
    PushXh,
    PushXl,
    PushYp,
    PushYh,
    PushYl,
    PushF,
    PopR,
    PopXp,
    PopXh,
    PopXl,
    PopYp,
    PopYh,
    PopYl,
    PopF,
    LdSphR,
    LdSplR,
    LdRSph,
    LdRSpl,

    // Arithmetic and logic.
    AddRI,
    AddRQ,
    AdcRI,
    AdcRQ,
    SubRQ,
    SbcRI,
    SbcRQ,
    AndRI,
    AndRQ,
    OrRI,
    OrRQ,
    XorRI,
    XorRQ,
    CpRI,
    CpRQ,
    FanRI,
    FanRQ,
    Rlc,
    Rrc,
    IncMn,
    DecMn,
    Acpx,
    Acpy,
    Scpx,
    Scpy,
    Not,

    /// Reserved opcode slot; executes as a 5-cycle no-op.
    Undefined,
}

impl OpClass {
    /// Clock cycles consumed by one execution of this class.
    pub const fn cycles(self) -> u32 {
        use OpClass::*;
        match self {
            Retd | Rets => 12,
            Call | Calz | Ret | Nop7 => 7,
            AdcXh | AdcXl | AdcYh | AdcYl | CpXh | CpXl | CpYh | CpYl => 7,
            Set | Rst => 7,
            AddRI | AddRQ | AdcRI | AdcRQ | SubRQ | SbcRI | SbcRQ | AndRI | AndRQ | OrRI
            | OrRQ | XorRI | XorRQ | CpRI | CpRQ | FanRI | FanRQ | Rlc | IncMn | DecMn | Acpx
            | Acpy | Scpx | Scpy | Not => 7,
            _ => 5,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        use OpClass::*;
        match self {
            Pset => "PSET p",
            Jp => "JP s",
            JpC => "JP C,s",
            JpNc => "JP NC,s",
            JpZ => "JP Z,s",
            JpNz => "JP NZ,s",
            Jpba => "JPBA",
            Call => "CALL s",
            Calz => "CALZ s",
            Ret => "RET",
            Rets => "RETS",
            Retd => "RETD e",
            Nop5 => "NOP5",
            Nop7 => "NOP7",
            Halt => "HALT",
            Slp => "SLP",
            IncX => "INC X",
            IncY => "INC Y",
            LdX => "LD X,e",
            LdY => "LD Y,e",
            LdXpR => "LD XP,r",
            LdXhR => "LD XH,r",
            LdXlR => "LD XL,r",
            LdYpR => "LD YP,r",
            LdYhR => "LD YH,r",
            LdYlR => "LD YL,r",
            LdRXp => "LD r,XP",
            LdRXh => "LD r,XH",
            LdRXl => "LD r,XL",
            LdRYp => "LD r,YP",
            LdRYh => "LD r,YH",
            LdRYl => "LD r,YL",
            AdcXh => "ADC XH,i",
            AdcXl => "ADC XL,i",
            AdcYh => "ADC YH,i",
            AdcYl => "ADC YL,i",
            CpXh => "CP XH,i",
            CpXl => "CP XL,i",
            CpYh => "CP YH,i",
            CpYl => "CP YL,i",
            LdRI => "LD r,i",
            LdRQ => "LD r,q",
            LdAMn => "LD A,Mn",
            LdBMn => "LD B,Mn",
            LdMnA => "LD Mn,A",
            LdMnB => "LD Mn,B",
            LdpxMx => "LDPX MX,i",
            LdpxRQ => "LDPX r,q",
            LdpyMy => "LDPY MY,i",
            LdpyRQ => "LDPY r,q",
            Lbpx => "LBPX MX,e",
            Set => "SET F,i",
            Rst => "RST F,i",
            IncSp => "INC SP",
            DecSp => "DEC SP",
            PushR => "PUSH r",
            PushXp => "PUSH XP",
            PushXh => "PUSH XH",
            PushXl => "PUSH XL",
            PushYp => "PUSH YP",
            PushYh => "PUSH YH",
            PushYl => "PUSH YL",
            PushF => "PUSH F",
            PopR => "POP r",
            PopXp => "POP XP",
            PopXh => "POP XH",
            PopXl => "POP XL",
            PopYp => "POP YP",
            PopYh => "POP YH",
            PopYl => "POP YL",
            PopF => "POP F",
            LdSphR => "LD SPH,r",
            LdSplR => "LD SPL,r",
            LdRSph => "LD r,SPH",
            LdRSpl => "LD r,SPL",
            AddRI => "ADD r,i",
            AddRQ => "ADD r,q",
            AdcRI => "ADC r,i",
            AdcRQ => "ADC r,q",
            SubRQ => "SUB r,q",
            SbcRI => "SBC r,i",
            SbcRQ => "SBC r,q",
            AndRI => "AND r,i",
            AndRQ => "AND r,q",
            OrRI => "OR r,i",
            OrRQ => "OR r,q",
            XorRI => "XOR r,i",
            XorRQ => "XOR r,q",
            CpRI => "CP r,i",
            CpRQ => "CP r,q",
            FanRI => "FAN r,i",
            FanRQ => "FAN r,q",
            Rlc => "RLC r",
            Rrc => "RRC r",
            IncMn => "INC Mn",
            DecMn => "DEC Mn",
            Acpx => "ACPX MX,r",
            Acpy => "ACPY MY,r",
            Scpx => "SCPX MX,r",
            Scpy => "SCPY MY,r",
            Not => "NOT r",
            Undefined => "???",
        }
    }
}

/// One row of the declarative opcode map: every opcode in
/// `first..=last` decodes to `class`.
///
/// Alias rows name a subset of an earlier row under a different mnemonic
/// (INC X is LDPX A,A; NOT r is XOR r,#F). They are applied after the
/// base rows, so they are the only rows allowed to overlap.
#[derive(Clone, Copy, Debug)]
pub struct OpRange {
    pub first: u16,
    pub last: u16,
    pub class: OpClass,
    pub alias: bool,
}

impl OpRange {
    const fn new(first: u16, last: u16, class: OpClass) -> Self {
        Self {
            first,
            last,
            class,
            alias: false,
        }
    }

    const fn alias(first: u16, last: u16, class: OpClass) -> Self {
        Self {
            first,
            last,
            class,
            alias: true,
        }
    }

    /// A row covering `width` consecutive opcodes from `first`.
    const fn span(first: u16, width: u16, class: OpClass) -> Self {
        Self::new(first, first + width - 1, class)
    }
}

/// The E0C6200 opcode map. Row boundaries follow the instruction table
/// bit patterns: a field of `n` free bits spans `1 << n` opcodes.
pub const OPCODE_RANGES: &[OpRange] = &[
    // 0x000-0x9FF: 8-bit immediate branches and index loads.
    OpRange::span(0x000, 256, OpClass::Jp),
    OpRange::span(0x100, 256, OpClass::Retd),
    OpRange::span(0x200, 256, OpClass::JpC),
    OpRange::span(0x300, 256, OpClass::JpNc),
    OpRange::span(0x400, 256, OpClass::Call),
    OpRange::span(0x500, 256, OpClass::Calz),
    OpRange::span(0x600, 256, OpClass::JpZ),
    OpRange::span(0x700, 256, OpClass::JpNz),
    OpRange::span(0x800, 256, OpClass::LdY),
    OpRange::span(0x900, 256, OpClass::Lbpx),
    // 0xA00-0xAFF: index arithmetic and register/register ALU.
    OpRange::span(0xA00, 16, OpClass::AdcXh),
    OpRange::span(0xA10, 16, OpClass::AdcXl),
    OpRange::span(0xA20, 16, OpClass::AdcYh),
    OpRange::span(0xA30, 16, OpClass::AdcYl),
    OpRange::span(0xA40, 16, OpClass::CpXh),
    OpRange::span(0xA50, 16, OpClass::CpXl),
    OpRange::span(0xA60, 16, OpClass::CpYh),
    OpRange::span(0xA70, 16, OpClass::CpYl),
    OpRange::span(0xA80, 16, OpClass::AddRQ),
    OpRange::span(0xA90, 16, OpClass::AdcRQ),
    OpRange::span(0xAA0, 16, OpClass::SubRQ),
    OpRange::span(0xAB0, 16, OpClass::SbcRQ),
    OpRange::span(0xAC0, 16, OpClass::AndRQ),
    OpRange::span(0xAD0, 16, OpClass::OrRQ),
    OpRange::span(0xAE0, 16, OpClass::XorRQ),
    OpRange::span(0xAF0, 16, OpClass::Rlc),
    OpRange::span(0xB00, 256, OpClass::LdX),
    // 0xC00-0xDFF: register/immediate ALU.
    OpRange::span(0xC00, 64, OpClass::AddRI),
    OpRange::span(0xC40, 64, OpClass::AdcRI),
    OpRange::span(0xC80, 64, OpClass::AndRI),
    OpRange::span(0xCC0, 64, OpClass::OrRI),
    OpRange::span(0xD00, 64, OpClass::XorRI),
    OpRange::span(0xD40, 64, OpClass::SbcRI),
    OpRange::span(0xD80, 64, OpClass::FanRI),
    OpRange::span(0xDC0, 64, OpClass::CpRI),
    // 0xE00-0xEFF: loads, page set, index nibble transfers.
    OpRange::span(0xE00, 64, OpClass::LdRI),
    OpRange::span(0xE40, 32, OpClass::Pset),
    OpRange::span(0xE60, 16, OpClass::LdpxMx),
    OpRange::span(0xE70, 16, OpClass::LdpyMy),
    OpRange::span(0xE80, 4, OpClass::LdXpR),
    OpRange::span(0xE84, 4, OpClass::LdXhR),
    OpRange::span(0xE88, 4, OpClass::LdXlR),
    OpRange::span(0xE8C, 4, OpClass::Rrc),
    OpRange::span(0xE90, 4, OpClass::LdYpR),
    OpRange::span(0xE94, 4, OpClass::LdYhR),
    OpRange::span(0xE98, 4, OpClass::LdYlR),
    OpRange::span(0xEA0, 4, OpClass::LdRXp),
    OpRange::span(0xEA4, 4, OpClass::LdRXh),
    OpRange::span(0xEA8, 4, OpClass::LdRXl),
    OpRange::span(0xEB0, 4, OpClass::LdRYp),
    OpRange::span(0xEB4, 4, OpClass::LdRYh),
    OpRange::span(0xEB8, 4, OpClass::LdRYl),
    OpRange::span(0xEC0, 16, OpClass::LdRQ),
    OpRange::span(0xEE0, 16, OpClass::LdpxRQ),
    OpRange::span(0xEF0, 16, OpClass::LdpyRQ),
    // 0xF00-0xFFF: compare, flags, memory, stack, system.
    OpRange::span(0xF00, 16, OpClass::CpRQ),
    OpRange::span(0xF10, 16, OpClass::FanRQ),
    OpRange::span(0xF28, 4, OpClass::Acpx),
    OpRange::span(0xF2C, 4, OpClass::Acpy),
    OpRange::span(0xF38, 4, OpClass::Scpx),
    OpRange::span(0xF3C, 4, OpClass::Scpy),
    OpRange::span(0xF40, 16, OpClass::Set),
    OpRange::span(0xF50, 16, OpClass::Rst),
    OpRange::span(0xF60, 16, OpClass::IncMn),
    OpRange::span(0xF70, 16, OpClass::DecMn),
    OpRange::span(0xF80, 16, OpClass::LdMnA),
    OpRange::span(0xF90, 16, OpClass::LdMnB),
    OpRange::span(0xFA0, 16, OpClass::LdAMn),
    OpRange::span(0xFB0, 16, OpClass::LdBMn),
    OpRange::span(0xFC0, 4, OpClass::PushR),
    OpRange::span(0xFC4, 1, OpClass::PushXp),
    OpRange::span(0xFC5, 1, OpClass::PushXh),
    OpRange::span(0xFC6, 1, OpClass::PushXl),
    OpRange::span(0xFC7, 1, OpClass::PushYp),
    OpRange::span(0xFC8, 1, OpClass::PushYh),
    OpRange::span(0xFC9, 1, OpClass::PushYl),
    OpRange::span(0xFCA, 1, OpClass::PushF),
    OpRange::span(0xFCB, 1, OpClass::DecSp),
    OpRange::span(0xFD0, 4, OpClass::PopR),
    OpRange::span(0xFD4, 1, OpClass::PopXp),
    OpRange::span(0xFD5, 1, OpClass::PopXh),
    OpRange::span(0xFD6, 1, OpClass::PopXl),
    OpRange::span(0xFD7, 1, OpClass::PopYp),
    OpRange::span(0xFD8, 1, OpClass::PopYh),
    OpRange::span(0xFD9, 1, OpClass::PopYl),
    OpRange::span(0xFDA, 1, OpClass::PopF),
    OpRange::span(0xFDB, 1, OpClass::IncSp),
    OpRange::span(0xFDE, 1, OpClass::Rets),
    OpRange::span(0xFDF, 1, OpClass::Ret),
    OpRange::span(0xFE0, 4, OpClass::LdSphR),
    OpRange::span(0xFE4, 4, OpClass::LdRSph),
    OpRange::span(0xFE8, 1, OpClass::Jpba),
    OpRange::span(0xFF0, 4, OpClass::LdSplR),
    OpRange::span(0xFF4, 4, OpClass::LdRSpl),
    OpRange::span(0xFF8, 1, OpClass::Halt),
    OpRange::span(0xFF9, 1, OpClass::Slp),
    OpRange::span(0xFFB, 1, OpClass::Nop5),
    OpRange::span(0xFFF, 1, OpClass::Nop7),
    // Aliases.
    OpRange::alias(0xEE0, 0xEE0, OpClass::IncX),
    OpRange::alias(0xEF0, 0xEF0, OpClass::IncY),
    OpRange::alias(0xD0F, 0xD0F, OpClass::Not),
    OpRange::alias(0xD1F, 0xD1F, OpClass::Not),
    OpRange::alias(0xD2F, 0xD2F, OpClass::Not),
    OpRange::alias(0xD3F, 0xD3F, OpClass::Not),
];

fn build_dispatch_table() -> [OpClass; OPCODE_COUNT] {
    let mut table = [OpClass::Undefined; OPCODE_COUNT];
    let base = OPCODE_RANGES.iter().filter(|range| !range.alias);
    let aliases = OPCODE_RANGES.iter().filter(|range| range.alias);
    for range in base.chain(aliases) {
        for opcode in range.first..=range.last {
            table[opcode as usize] = range.class;
        }
    }
    table
}

lazy_static! {
    static ref DISPATCH_TABLE: [OpClass; OPCODE_COUNT] = build_dispatch_table();
}

/// Resolve a 12-bit opcode to its instruction class.
#[inline]
pub fn decode(opcode: u16) -> OpClass {
    DISPATCH_TABLE[(opcode as usize) & (OPCODE_COUNT - 1)]
}
