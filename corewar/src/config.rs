//! Configuration for a single match and for a tournament over many matches,
//! with eager validation the way [`crate::program::Program`] is validated
//! before it is ever placed in memory.

use crate::constants::*;
use crate::error::ConfigError;
use rand::{thread_rng, Rng};

/// Tunable limits for one run of the VM. Every field has the default the
/// distribution ships (see the associated constants in [`crate::constants`]).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MatchConfig {
    pub memory_size: usize,
    pub max_threads: usize,
    pub cycles_to_completion: u64,
    pub max_program_length: usize,
    pub min_program_distance: usize,
    /// Seed for the pseudo-random placement shuffle. `None` means "draw a
    /// fresh seed at [`MatchConfig::new`] time", which makes repeated runs
    /// of the same config vary; pin it for a reproducible replay.
    pub placement_seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            memory_size: DEFAULT_MEMORY_SIZE,
            max_threads: DEFAULT_MAX_THREADS,
            cycles_to_completion: DEFAULT_CYCLES_TO_COMPLETION,
            max_program_length: DEFAULT_MAX_PROGRAM_LENGTH,
            min_program_distance: DEFAULT_MIN_PROGRAM_DISTANCE,
            placement_seed: None,
        }
    }
}

impl MatchConfig {
    /// Builds a config with a placement seed already drawn from the
    /// process-wide RNG, so callers that never pin a seed still get a
    /// concrete, loggable value rather than re-rolling it on every shuffle.
    pub fn new() -> Self {
        MatchConfig {
            placement_seed: Some(thread_rng().gen()),
            ..Default::default()
        }
    }

    /// The seed placement should use: the pinned seed if set, otherwise a
    /// freshly drawn one.
    pub fn resolved_seed(&self) -> u64 {
        self.placement_seed.unwrap_or_else(|| thread_rng().gen())
    }

    /// Checks the bounds every component of the VM assumes hold. Per the
    /// distilled source this bounds check must reject with `OR` semantics:
    /// a memory size is invalid if it is *either* too small *or* too large,
    /// not only when both hold at once.
    pub fn validate(&self, program_count: usize) -> Result<(), ConfigError> {
        if self.memory_size < MIN_MEMORY_SIZE || self.memory_size > MAX_MEMORY_SIZE {
            return Err(ConfigError::MemorySizeOutOfBounds(self.memory_size));
        }
        if self.max_threads < program_count {
            return Err(ConfigError::NotEnoughThreadCapacity {
                max_threads: self.max_threads,
                programs: program_count,
            });
        }
        if self.cycles_to_completion == 0 {
            return Err(ConfigError::NoCycleBudget);
        }
        if self.max_program_length == 0 {
            return Err(ConfigError::NoProgramLengthBudget);
        }
        Ok(())
    }
}

/// Configuration for a round-robin tournament over a pool of programs:
/// a [`MatchConfig`] shared by every match, plus how many programs compete
/// per match and how many rounds each matchup is repeated.
#[derive(Clone, Debug)]
pub struct TournamentConfig {
    pub match_config: MatchConfig,
    pub viruses_per_match: usize,
    pub rounds_per_setup: u32,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        TournamentConfig {
            match_config: MatchConfig::default(),
            viruses_per_match: DEFAULT_VIRUSES_PER_MATCH,
            rounds_per_setup: DEFAULT_ROUNDS_PER_SETUP,
        }
    }
}

impl TournamentConfig {
    pub fn validate(&self, pool_size: usize) -> Result<(), ConfigError> {
        if self.viruses_per_match > pool_size {
            return Err(ConfigError::NotEnoughPrograms {
                per_match: self.viruses_per_match,
                pool_size,
            });
        }
        self.match_config.validate(self.viruses_per_match)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_memory_below_the_floor() {
        let mut cfg = MatchConfig::default();
        cfg.memory_size = 10;
        assert_eq!(
            cfg.validate(1),
            Err(ConfigError::MemorySizeOutOfBounds(10))
        );
    }

    #[test]
    fn rejects_memory_above_the_ceiling() {
        let mut cfg = MatchConfig::default();
        cfg.memory_size = 1_000_000;
        assert_eq!(
            cfg.validate(1),
            Err(ConfigError::MemorySizeOutOfBounds(1_000_000))
        );
    }

    #[test]
    fn rejects_too_few_thread_slots() {
        let mut cfg = MatchConfig::default();
        cfg.max_threads = 1;
        assert_eq!(
            cfg.validate(2),
            Err(ConfigError::NotEnoughThreadCapacity {
                max_threads: 1,
                programs: 2
            })
        );
    }

    #[test]
    fn default_config_validates_for_a_two_program_match() {
        assert!(MatchConfig::default().validate(2).is_ok());
    }
}
