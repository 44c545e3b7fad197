//! The error taxonomy for everything that can keep a match from running at
//! all. Faults that occur *during* a match (an illegal fetch, a division by
//! zero) are not errors in this sense: they terminate the offending
//! thread and are reported through [`crate::listener::MatchListener`], not
//! through a `Result`. See [`ThreadFault`].

use thiserror::Error;

/// A configuration value outside the bounds the machine can run with.
/// Raised by [`crate::config::MatchConfig::validate`] before a match or
/// tournament starts.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ConfigError {
    #[error("memory size {0} out of bounds [{}, {}]", crate::constants::MIN_MEMORY_SIZE, crate::constants::MAX_MEMORY_SIZE)]
    MemorySizeOutOfBounds(usize),
    #[error("max_threads ({max_threads}) is smaller than the number of programs ({programs})")]
    NotEnoughThreadCapacity { max_threads: usize, programs: usize },
    #[error("cycles_to_completion must be greater than zero")]
    NoCycleBudget,
    #[error("max_program_length must be greater than zero")]
    NoProgramLengthBudget,
    #[error("viruses_per_match ({per_match}) is greater than the pool size ({pool_size})")]
    NotEnoughPrograms { per_match: usize, pool_size: usize },
}

/// Everything else that can abort a match before it produces an outcome.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("program {name:?} has {length} instructions, over the max_program_length of {max}")]
    ProgramTooLong {
        name: String,
        length: usize,
        max: usize,
    },
    #[error(
        "cannot place {programs} program(s) of total length {total_length} in a memory of size \
         {memory_size} while keeping a minimum distance of {min_distance} between starts"
    )]
    InsufficientDistance {
        programs: usize,
        total_length: usize,
        memory_size: usize,
        min_distance: usize,
    },
}

/// A non-fatal fault encountered while single-stepping one thread. Never
/// escapes the VM as a `Result::Err`: it only terminates the thread that
/// hit it. Kept distinct from [`CoreError`], since a fault is routine
/// behavior of a running match, not a reason to abort it.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ThreadFault {
    /// The thread fetched a `DATA` cell as its next instruction.
    ExecutedData,
    /// An operand resolved to a literal-immediate or literal-offset
    /// parameter in a write position.
    IllegalWriteTarget,
    /// `DIV` or `MOD` with a zero right-hand operand.
    DivisionByZero,
}

impl std::fmt::Display for ThreadFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadFault::ExecutedData => write!(f, "fetched a DATA cell"),
            ThreadFault::IllegalWriteTarget => write!(f, "wrote to a non-addressable operand"),
            ThreadFault::DivisionByZero => write!(f, "divided by zero"),
        }
    }
}
