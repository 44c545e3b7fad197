//! The Core Wars virtual machine: a fixed-size circular memory shared by
//! several competing programs, a 32-bit instruction word, and a cooperative
//! round-robin scheduler over each program's live threads.
//!
//! This crate owns the machine itself: encoding, memory, registers,
//! threads, the single match loop and the tournament driver over many
//! matches. Turning source text into a [`program::CompiledProgram`] is the
//! job of the sibling `casm` crate; this crate only runs what it is given.

pub mod codec;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod listener;
pub mod match_controller;
pub mod memory;
pub mod program;
pub mod thread;
pub mod tournament;

pub use codec::{Opcode, Parameter};
pub use config::{MatchConfig, TournamentConfig};
pub use context::ExecutionContext;
pub use error::{ConfigError, CoreError};
pub use listener::MatchListener;
pub use match_controller::{Match, MatchOutcome, MatchReport};
pub use program::{CompiledProgram, Program, ProgramStepOutcome};
pub use thread::Thread;
pub use tournament::{RoundResult, Standing, Tournament, TournamentReport};

/// One memory cell / instruction word.
pub type Word = u32;

/// A signed literal parameter value, as it appears in source (`[-2048, 2047]`).
pub type Literal = i16;

/// A thread- or program-owned register index in `[1, 32]` (1..=16 private,
/// 17..=32 shared), as it appears in the instruction word's parameter field.
pub type RegisterIndex = u8;

/// An absolute memory address, always held in `[0, memory_size)`.
pub type Address = usize;

/// An opaque, monotonically increasing program id assigned by an
/// [`ExecutionContext`] at load time.
pub type ProgramId = u32;

/// An opaque, monotonically increasing thread id assigned by an
/// [`ExecutionContext`] for the lifetime of one match.
pub type ThreadId = u64;
