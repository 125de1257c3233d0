use bitflags::bitflags;

/// Mask applied to the 13-bit program counter (bank:page:step).
pub const PC_MASK: u16 = 0x1FFF;
/// Mask applied to the 12-bit index registers X and Y.
pub const INDEX_MASK: u16 = 0x0FFF;

bitflags! {
    /// The F register of the E0C6200 core.
    ///
    /// Layout (bit index in the nibble):
    /// - bit 3: I (interrupt enable)
    /// - bit 2: D (decimal adjust)
    /// - bit 1: Z (zero)
    /// - bit 0: C (carry)
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        const C = 0b0001;
        const Z = 0b0010;
        const D = 0b0100;
        const I = 0b1000;
    }
}

/// Selector used by most ALU and transfer instructions.
///
/// The encoding matches the 2-bit `r`/`q` fields of the opcode table:
/// 0=A, 1=B, 2=M(X), 3=M(Y).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    A,
    B,
    MX,
    MY,
}

impl Operand {
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        match bits & 0x3 {
            0 => Operand::A,
            1 => Operand::B,
            2 => Operand::MX,
            _ => Operand::MY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexReg {
    X,
    Y,
}

/// One nibble of an index register: page (bits 11..8), high (7..4) or
/// low (3..0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexPart {
    Page,
    High,
    Low,
}

impl IndexPart {
    #[inline]
    const fn shift(self) -> u16 {
        match self {
            IndexPart::Page => 8,
            IndexPart::High => 4,
            IndexPart::Low => 0,
        }
    }
}

/// Register file of the E0C6200 core.
///
/// Every field holds only as many bits as the hardware register; the
/// setters below take care of masking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub x: u16,
    pub y: u16,
    pub sp: u8,
    /// 13-bit program counter: bank (bit 12), page (11..8), step (7..0).
    pub pc: u16,
    /// New page pointer: bank (bit 4) and page (3..0) used by the next
    /// branch. Loaded by PSET, otherwise re-seeded from PC after every
    /// instruction.
    pub np: u8,
    pub flags: Flags,
}

impl Registers {
    #[inline]
    pub fn pc_bank(&self) -> u16 {
        (self.pc >> 12) & 0x1
    }

    #[inline]
    pub fn pc_page(&self) -> u8 {
        ((self.pc >> 8) & 0xF) as u8
    }

    #[inline]
    pub fn np_page(&self) -> u8 {
        self.np & 0xF
    }

    /// Bank and page of the current PC in NP layout.
    #[inline]
    pub fn pc_np(&self) -> u8 {
        ((self.pc >> 8) & 0x1F) as u8
    }

    #[inline]
    pub fn index(&self, reg: IndexReg) -> u16 {
        match reg {
            IndexReg::X => self.x,
            IndexReg::Y => self.y,
        }
    }

    #[inline]
    pub fn set_index(&mut self, reg: IndexReg, value: u16) {
        let value = value & INDEX_MASK;
        match reg {
            IndexReg::X => self.x = value,
            IndexReg::Y => self.y = value,
        }
    }

    #[inline]
    pub fn index_part(&self, reg: IndexReg, part: IndexPart) -> u8 {
        ((self.index(reg) >> part.shift()) & 0xF) as u8
    }

    #[inline]
    pub fn set_index_part(&mut self, reg: IndexReg, part: IndexPart, value: u8) {
        let shift = part.shift();
        let cleared = self.index(reg) & !(0xF << shift);
        self.set_index(reg, cleared | (((value & 0xF) as u16) << shift));
    }

    /// Increment the low 8 bits of an index register. The page nibble
    /// never changes, which is how LDPX/LDPY/ACPX/... walk a RAM page.
    #[inline]
    pub fn post_increment(&mut self, reg: IndexReg) {
        let index = self.index(reg);
        let low = index.wrapping_add(1) & 0xFF;
        self.set_index(reg, (index & 0xF00) | low);
    }

    #[inline]
    pub fn flag(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Flags, value: bool) {
        self.flags.set(flag, value);
    }
}
