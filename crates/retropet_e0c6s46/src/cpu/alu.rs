//! 4-bit ALU primitives shared by the arithmetic handlers.

/// Result of a 4-bit ALU operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AluResult {
    pub value: u8,
    pub carry: bool,
}

impl AluResult {
    #[inline]
    pub fn zero(&self) -> bool {
        self.value == 0
    }
}

/// `a + b + carry_in`, with decimal correction when `decimal` is set.
///
/// In decimal mode a sum of 10 or more is reduced by 10 (equivalently
/// +6 modulo 16) and carries.
#[inline]
pub(crate) fn add(a: u8, b: u8, carry_in: bool, decimal: bool) -> AluResult {
    let sum = (a & 0xF) + (b & 0xF) + carry_in as u8;
    if decimal && sum >= 10 {
        AluResult {
            value: (sum - 10) & 0xF,
            carry: true,
        }
    } else {
        AluResult {
            value: sum & 0xF,
            carry: sum > 0xF,
        }
    }
}

/// `a - b - borrow_in`, with decimal correction when `decimal` is set.
///
/// In decimal mode a negative difference is corrected by adding 10.
#[inline]
pub(crate) fn sub(a: u8, b: u8, borrow_in: bool, decimal: bool) -> AluResult {
    let diff = (a & 0xF) as i16 - (b & 0xF) as i16 - borrow_in as i16;
    let borrow = diff < 0;
    let value = if decimal && borrow { diff + 10 } else { diff };
    AluResult {
        value: (value & 0xF) as u8,
        carry: borrow,
    }
}

/// Rotate left through carry: returns the new nibble and carry out.
#[inline]
pub(crate) fn rotate_left(value: u8, carry_in: bool) -> AluResult {
    AluResult {
        value: ((value << 1) | carry_in as u8) & 0xF,
        carry: value & 0x8 != 0,
    }
}

/// Rotate right through carry: returns the new nibble and carry out.
#[inline]
pub(crate) fn rotate_right(value: u8, carry_in: bool) -> AluResult {
    AluResult {
        value: ((value & 0xF) >> 1) | ((carry_in as u8) << 3),
        carry: value & 0x1 != 0,
    }
}
