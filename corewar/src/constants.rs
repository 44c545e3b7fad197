//! Bit widths, masks and offsets for the 32-bit instruction word and its
//! 14-bit parameter fields, plus the tunable defaults from the match and
//! tournament configuration tables.

use crate::Word;

pub const WORD_WIDTH: u32 = 32;

pub const OPCODE_WIDTH: u32 = 4;
pub const PARAM_WIDTH: u32 = 14;

pub const OPCODE_OFFSET: u32 = 28;
pub const PARAM_A_OFFSET: u32 = 14;
pub const PARAM_B_OFFSET: u32 = 0;

pub const OPCODE_MASK: Word = 0b1111 << OPCODE_OFFSET;
pub const PARAM_A_MASK: Word = 0b11_1111_1111_1111 << PARAM_A_OFFSET;
pub const PARAM_B_MASK: Word = 0b11_1111_1111_1111 << PARAM_B_OFFSET;

/// Width, in bits, of a data value's two's-complement payload (low bits of
/// a cell, excluding the opcode field that a `DATA` instruction shares the
/// word with).
pub const DATA_VALUE_WIDTH: u32 = 28;
pub const DATA_VALUE_MASK: Word = (1 << DATA_VALUE_WIDTH) - 1;
pub const DATA_VALUE_SIGN_BIT: Word = 1 << (DATA_VALUE_WIDTH - 1);

pub const DATA_VALUE_MIN: i32 = -(1 << (DATA_VALUE_WIDTH - 1));
pub const DATA_VALUE_MAX: i32 = (1 << (DATA_VALUE_WIDTH - 1)) - 1;

/// Width of a parameter's kind-selector (top two bits of the 14-bit field).
pub const PARAM_CLASS_WIDTH: u32 = 2;
pub const PARAM_CLASS_OFFSET: u32 = PARAM_WIDTH - PARAM_CLASS_WIDTH;

/// Width of the signed payload carried by a literal-immediate or a
/// literal-offset parameter (12 bits: the 14-bit field minus its 2-bit
/// class selector).
pub const LITERAL_WIDTH: u32 = PARAM_WIDTH - PARAM_CLASS_WIDTH;
pub const LITERAL_MASK: Word = (1 << LITERAL_WIDTH) - 1;
pub const LITERAL_SIGN_BIT: Word = 1 << (LITERAL_WIDTH - 1);

pub const LITERAL_MIN: i32 = -(1 << (LITERAL_WIDTH - 1));
pub const LITERAL_MAX: i32 = (1 << (LITERAL_WIDTH - 1)) - 1;

/// Width of a register parameter's index field, plus its 2-bit dereference
/// tag, packed into the remaining 12 bits below the class selector.
pub const REGISTER_INDEX_WIDTH: u32 = 5;
pub const REGISTER_INDEX_MASK: Word = (1 << REGISTER_INDEX_WIDTH) - 1;
pub const REGISTER_DEREF_WIDTH: u32 = 2;
pub const REGISTER_DEREF_MASK: Word = (1 << REGISTER_DEREF_WIDTH) - 1;

pub const PRIVATE_REGISTER_COUNT: usize = 16;
pub const SHARED_REGISTER_COUNT: usize = 16;

/// Registers `1..=16` address a thread's private registers; `17..=32`
/// address the owning program's shared registers.
pub const FIRST_SHARED_REGISTER: u8 = PRIVATE_REGISTER_COUNT as u8 + 1;

pub const MIN_MEMORY_SIZE: usize = 256;
pub const MAX_MEMORY_SIZE: usize = 65536;

pub const DEFAULT_MEMORY_SIZE: usize = 8000;
pub const DEFAULT_MAX_THREADS: usize = 2000;
pub const DEFAULT_CYCLES_TO_COMPLETION: u64 = 80_000;
pub const DEFAULT_MAX_PROGRAM_LENGTH: usize = 100;
pub const DEFAULT_MIN_PROGRAM_DISTANCE: usize = 100;
pub const DEFAULT_VIRUSES_PER_MATCH: usize = 2;
pub const DEFAULT_ROUNDS_PER_SETUP: u32 = 4;
