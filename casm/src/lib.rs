//! Assembler and disassembler for the Core Wars virtual machine's
//! textual source language.
//!
//! A source file is a sequence of lines, each either blank, a comment,
//! a `label:` declaration, or exactly one statement. [`assemble`] turns
//! such a file into a [`corewar::CompiledProgram`] plus a
//! [`error::CompileReport`] of whatever went wrong along the way; a line
//! that fails to compile becomes a `NOP` rather than aborting the whole
//! file, so line numbers in later diagnostics still line up with the
//! source. [`disassemble`] is the other direction: one instruction word
//! back to the line that would reassemble to it.
//!
//! ## Statement forms
//!
//! Matched in this order, first match wins:
//!
//! | form | produced |
//! |------|----------|
//! | `nop` | NOP |
//! | `jump <addr> if --<ref> != 0` | DEC_JUMP_NOT_ZERO |
//! | `jump <addr> if <val> OP 0` (`OP` ∈ `{==,!=,<,>}`) | JUMP_ZERO/NOT_ZERO/LT/GT |
//! | `jump <addr>` | JUMP |
//! | `fork <addr>` | FORK |
//! | `<val> <=> <val>` | COMPARE |
//! | `<ref> OP <val>` (`OP` ∈ `{=,+=,-=,*=,/=,%=}`) | ASSIGN/ADD/SUB/MUL/DIV/MOD |
//! | `data <expr>` | DATA |
//!
//! Operands are `r1`..`r16` / `s1`..`s16` for registers, a decimal or
//! `0x`-hex number, or a label, all optionally prefixed with up to two
//! `@` for memory indirection. A label used as an operand resolves to
//! its address minus the current line's address (PC-relative), since
//! every branch form adds it directly to `pc`.

mod assembler;
mod disassembler;
pub mod error;
mod expr;
mod operand;
pub mod symbols;
mod statement;

pub use assembler::{assemble, assemble_with_symbols};
pub use disassembler::disassemble;
pub use error::{CompileError, CompileReport};
pub use symbols::PredefinedSymbols;
