//! Packing and unpacking of the 32-bit instruction word.
//!
//! An instruction word is laid out `[opcode:4][a:14][b:14]`. A `DATA` cell
//! widens its single operand to the full 28 low bits instead.

use crate::constants::*;
use crate::{Literal, RegisterIndex, Word};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use util::EnumFromStr;
use util_derive::EnumFromStr;

/// The sixteen instructions the machine understands.
///
/// Variant order matches the 4-bit opcode field: `Opcode::Data as u32 == 0`,
/// and so on.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, FromPrimitive, ToPrimitive, EnumFromStr)]
pub enum Opcode {
    Data = 0,
    Nop,
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Compare,
    Jump,
    JumpZero,
    JumpNotZero,
    JumpLessThan,
    JumpGreaterThan,
    DecJumpNotZero,
    Fork,
}

impl Opcode {
    /// Decodes the 4-bit opcode field out of a full instruction word.
    pub fn decode(word: Word) -> Opcode {
        let raw = (word & OPCODE_MASK) >> OPCODE_OFFSET;
        // Infallible: every 4-bit value has a variant, `Data` through `Fork`.
        Opcode::from_u32(raw).expect("opcode field is always 4 bits wide")
    }

    /// The source mnemonic for opcodes with no dedicated statement form.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Data => "data",
            Opcode::Nop => "nop",
            Opcode::Assign => "=",
            Opcode::Add => "+=",
            Opcode::Sub => "-=",
            Opcode::Mul => "*=",
            Opcode::Div => "/=",
            Opcode::Mod => "%=",
            Opcode::Compare => "<=>",
            Opcode::Jump => "jump",
            Opcode::JumpZero => "==",
            Opcode::JumpNotZero => "!=",
            Opcode::JumpLessThan => "<",
            Opcode::JumpGreaterThan => ">",
            Opcode::DecJumpNotZero => "--",
            Opcode::Fork => "fork",
        }
    }
}

/// Encodes a full instruction word from its opcode and two raw 14-bit
/// parameter fields, as produced by [`Parameter::encode`].
pub fn encode(opcode: Opcode, a: u16, b: u16) -> Word {
    debug_assert!(a as u32 <= PARAM_A_MASK >> PARAM_A_OFFSET);
    debug_assert!(b as u32 <= PARAM_B_MASK >> PARAM_B_OFFSET);
    let opcode = opcode.to_u32().expect("Opcode always fits in 4 bits") << OPCODE_OFFSET;
    opcode | ((a as Word) << PARAM_A_OFFSET) | (b as Word)
}

/// The raw 14-bit `a` field of an instruction word.
pub fn a_of(word: Word) -> u16 {
    ((word & PARAM_A_MASK) >> PARAM_A_OFFSET) as u16
}

/// The raw 14-bit `b` field of an instruction word.
pub fn b_of(word: Word) -> u16 {
    (word & PARAM_B_MASK) as u16
}

/// Encodes a `DATA` cell: opcode field zero, value stored in the low 28
/// bits. `value` must fit a 28-bit two's-complement integer.
pub fn encode_data(value: i32) -> Word {
    debug_assert!((DATA_VALUE_MIN..=DATA_VALUE_MAX).contains(&value));
    (value as Word) & DATA_VALUE_MASK
}

/// Sign-extends the low 28 bits of a cell into a signed "data value".
pub fn data_value_of(word: Word) -> i32 {
    let low = word & DATA_VALUE_MASK;
    if low & DATA_VALUE_SIGN_BIT != 0 {
        (low | !DATA_VALUE_MASK) as i32
    } else {
        low as i32
    }
}

/// Truncates an arithmetic result into a data-value word with
/// two's-complement wraparound. Used for ADD/SUB/MUL and the
/// DEC_JUMP_NOT_ZERO decrement.
pub fn encode_data_wrapping(value: i64) -> Word {
    (value as u64 & DATA_VALUE_MASK as u64) as Word
}

/// A decoded 14-bit operand.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Parameter {
    /// `00`: a signed 12-bit literal, used directly with no dereference.
    /// Never a valid write target.
    Literal(Literal),
    /// `01`: a register operand. `index` is `1..=16` for a thread's
    /// private registers, `17..=32` for the owning program's shared
    /// registers. `derefs` is `0` for direct, `1` or `2` for indirect
    /// through memory, using the register's word as the first offset.
    Register { index: RegisterIndex, derefs: u8 },
    /// `10`/`11`: a signed 12-bit offset added to the program counter,
    /// dereferenced once or twice through memory.
    Offset { offset: Literal, derefs: u8 },
}

const CLASS_LITERAL: u16 = 0b00;
const CLASS_REGISTER: u16 = 0b01;
const CLASS_OFFSET_1: u16 = 0b10;
const CLASS_OFFSET_2: u16 = 0b11;

fn sign_extend_12(raw: u16) -> Literal {
    let raw = raw as u32 & LITERAL_MASK;
    if raw & LITERAL_SIGN_BIT != 0 {
        (raw | !LITERAL_MASK) as i32 as Literal
    } else {
        raw as Literal
    }
}

fn truncate_12(value: Literal) -> u16 {
    debug_assert!((LITERAL_MIN..=LITERAL_MAX).contains(&(value as i32)));
    (value as u32 & LITERAL_MASK) as u16
}

impl Parameter {
    /// Decodes a raw 14-bit field, as produced by [`a_of`]/[`b_of`].
    pub fn decode(raw: u16) -> Parameter {
        let class = (raw as u32) >> PARAM_CLASS_OFFSET;
        match class as u16 {
            CLASS_LITERAL => Parameter::Literal(sign_extend_12(raw)),
            CLASS_REGISTER => {
                let index = (raw as u32 & REGISTER_INDEX_MASK) as RegisterIndex;
                let derefs = ((raw as u32 >> REGISTER_INDEX_WIDTH) & REGISTER_DEREF_MASK) as u8;
                Parameter::Register {
                    index: index.min(31) + 1,
                    derefs: derefs.min(2),
                }
            }
            CLASS_OFFSET_1 => Parameter::Offset {
                offset: sign_extend_12(raw),
                derefs: 1,
            },
            _ => Parameter::Offset {
                offset: sign_extend_12(raw),
                derefs: 2,
            },
        }
    }

    /// Encodes this operand into the raw 14-bit field a word's `a` or `b`
    /// half carries.
    pub fn encode(self) -> u16 {
        match self {
            Parameter::Literal(value) => (CLASS_LITERAL << PARAM_CLASS_OFFSET) | truncate_12(value),
            Parameter::Register { index, derefs } => {
                debug_assert!((1..=32).contains(&index));
                let index0 = (index - 1) as u32 & REGISTER_INDEX_MASK;
                let derefs = (derefs.min(2) as u32) << REGISTER_INDEX_WIDTH;
                ((CLASS_REGISTER as u32) << PARAM_CLASS_OFFSET) as u16 | (index0 | derefs) as u16
            }
            Parameter::Offset { offset, derefs } => {
                let class = if derefs <= 1 { CLASS_OFFSET_1 } else { CLASS_OFFSET_2 };
                (class << PARAM_CLASS_OFFSET) | truncate_12(offset)
            }
        }
    }

    /// Memory indirections required before this operand names the address
    /// actually read or written. `0` for a direct operand.
    pub fn dereference_count(self) -> u8 {
        match self {
            Parameter::Literal(_) => 0,
            Parameter::Register { derefs, .. } => derefs,
            Parameter::Offset { derefs, .. } => derefs,
        }
    }

    /// `true` for register operands addressing indices `17..=32`, the
    /// registers owned by the program rather than the running thread.
    pub fn is_shared_register(self) -> bool {
        matches!(self, Parameter::Register { index, .. } if index >= FIRST_SHARED_REGISTER)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn opcode_round_trips_through_all_sixteen_values() {
        for raw in 0u32..16 {
            let word = raw << OPCODE_OFFSET;
            let opcode = Opcode::decode(word);
            assert_eq!(opcode.to_u32().unwrap(), raw);
        }
    }

    #[test]
    fn literal_parameter_round_trips() {
        for value in [-2048i16, -1, 0, 1, 2047] {
            let raw = Parameter::Literal(value).encode();
            assert_eq!(Parameter::decode(raw), Parameter::Literal(value));
        }
    }

    #[test]
    fn register_parameter_round_trips() {
        for index in [1u8, 16, 17, 32] {
            for derefs in [0u8, 1, 2] {
                let p = Parameter::Register { index, derefs };
                assert_eq!(Parameter::decode(p.encode()), p);
            }
        }
    }

    #[test]
    fn offset_parameter_round_trips() {
        for offset in [-2048i16, 0, 2047] {
            for derefs in [1u8, 2] {
                let p = Parameter::Offset { offset, derefs };
                assert_eq!(Parameter::decode(p.encode()), p);
            }
        }
    }

    #[test]
    fn encode_data_wrapping_truncates_overflowing_results() {
        assert_eq!(data_value_of(encode_data_wrapping(DATA_VALUE_MAX as i64 + 1)), DATA_VALUE_MIN);
        assert_eq!(data_value_of(encode_data_wrapping(DATA_VALUE_MIN as i64 - 1)), DATA_VALUE_MAX);
        assert_eq!(data_value_of(encode_data_wrapping(0)), 0);
    }

    #[test]
    fn data_value_sign_extends_the_full_range() {
        assert_eq!(data_value_of(encode_data(DATA_VALUE_MIN)), DATA_VALUE_MIN);
        assert_eq!(data_value_of(encode_data(DATA_VALUE_MAX)), DATA_VALUE_MAX);
        assert_eq!(data_value_of(encode_data(-1)), -1);
        assert_eq!(data_value_of(encode_data(0)), 0);
    }

    #[quickcheck]
    fn instruction_encode_decode_round_trips(opcode_raw: u8, a: u16, b: u16) -> bool {
        let opcode = Opcode::from_u8(opcode_raw % 16).unwrap();
        let a = a & (LITERAL_MASK as u16 | (0b11 << PARAM_CLASS_OFFSET));
        let b = b & (LITERAL_MASK as u16 | (0b11 << PARAM_CLASS_OFFSET));
        let word = encode(opcode, a, b);
        Opcode::decode(word) == opcode && a_of(word) == a && b_of(word) == b
    }

    #[quickcheck]
    fn data_value_round_trips_over_full_signed_range(value: i32) -> bool {
        let value = DATA_VALUE_MIN + (value.rem_euclid(DATA_VALUE_MAX - DATA_VALUE_MIN + 1));
        data_value_of(encode_data(value)) == value
    }
}
