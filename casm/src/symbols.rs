//! The predefined symbol table a source file can reference without
//! declaring its own label: the match/tournament limits it will run
//! under, plus the implicit `OFFSET` (handled separately, since its
//! value depends on the line being assembled rather than being fixed
//! for the whole file).

use corewar::constants::{
    DEFAULT_CYCLES_TO_COMPLETION, DEFAULT_MAX_PROGRAM_LENGTH, DEFAULT_MAX_THREADS,
    DEFAULT_MEMORY_SIZE, DEFAULT_MIN_PROGRAM_DISTANCE, DEFAULT_ROUNDS_PER_SETUP,
    DEFAULT_VIRUSES_PER_MATCH,
};

/// Keywords a label must never collide with, independent of whichever
/// predefined symbols are in scope: register forms and every statement
/// keyword.
pub const RESERVED_WORDS: &[&str] = &["jump", "if", "fork", "data", "nop"];

/// `MEM_SIZE`, `MAX_THREADS`, `MAX_CYCLES`, `MAX_LENGTH`, `MIN_DISTANCE`,
/// `VIRUSES`, `ROUNDS`: the limits a program is compiled against. These
/// default to the same values [`corewar::config::MatchConfig`] and
/// [`corewar::config::TournamentConfig`] ship, but a caller assembling
/// against a non-default configuration should build this from it instead
/// so `MEM_SIZE` et al. agree with the match the program will actually run
/// in.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct PredefinedSymbols {
    pub mem_size: i64,
    pub max_threads: i64,
    pub max_cycles: i64,
    pub max_length: i64,
    pub min_distance: i64,
    pub viruses: i64,
    pub rounds: i64,
}

impl Default for PredefinedSymbols {
    fn default() -> Self {
        PredefinedSymbols {
            mem_size: DEFAULT_MEMORY_SIZE as i64,
            max_threads: DEFAULT_MAX_THREADS as i64,
            max_cycles: DEFAULT_CYCLES_TO_COMPLETION as i64,
            max_length: DEFAULT_MAX_PROGRAM_LENGTH as i64,
            min_distance: DEFAULT_MIN_PROGRAM_DISTANCE as i64,
            viruses: DEFAULT_VIRUSES_PER_MATCH as i64,
            rounds: DEFAULT_ROUNDS_PER_SETUP as i64,
        }
    }
}

impl PredefinedSymbols {
    pub fn lookup(&self, name: &str) -> Option<i64> {
        match name {
            "MEM_SIZE" => Some(self.mem_size),
            "MAX_THREADS" => Some(self.max_threads),
            "MAX_CYCLES" => Some(self.max_cycles),
            "MAX_LENGTH" => Some(self.max_length),
            "MIN_DISTANCE" => Some(self.min_distance),
            "VIRUSES" => Some(self.viruses),
            "ROUNDS" => Some(self.rounds),
            _ => None,
        }
    }

    pub fn is_defined(name: &str) -> bool {
        matches!(
            name,
            "MEM_SIZE" | "MAX_THREADS" | "MAX_CYCLES" | "MAX_LENGTH" | "MIN_DISTANCE" | "VIRUSES" | "ROUNDS" | "OFFSET"
        )
    }
}
