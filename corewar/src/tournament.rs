//! Round-robin tournament over a pool of programs: every `k`-subset of
//! the pool plays `rounds_per_setup` matches against itself, and wins,
//! ties and losses accumulate into a per-program [`Standing`].

use crate::config::TournamentConfig;
use crate::error::CoreError;
use crate::listener::{MatchListener, NullListener};
use crate::match_controller::{Match, MatchOutcome};
use crate::program::CompiledProgram;
use crate::ProgramId;
use itertools::Itertools;
use tracing::info_span;

const POINTS_PER_WIN: u32 = 2;
const POINTS_PER_TIE: u32 = 1;

/// One program's cumulative record across every round it took part in.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Standing {
    pub name: String,
    pub wins: u32,
    pub ties: u32,
    pub losses: u32,
    pub points: u32,
}

/// The outcome of a single round played by one `k`-subset of the pool.
#[derive(Clone, Debug)]
pub struct RoundResult {
    /// Pool indices of the programs that played this round, in the order
    /// they were handed to the underlying [`Match`].
    pub participants: Vec<ProgramId>,
    pub outcome: MatchOutcome,
}

/// The full record of a tournament run: every round played, and the
/// final standings table, sorted by points descending.
#[derive(Clone, Debug)]
pub struct TournamentReport {
    pub rounds: Vec<RoundResult>,
    pub standings: Vec<Standing>,
}

/// Drives a round-robin tournament: enumerates every `k`-subset of a
/// program pool in lexicographic order of pool index, plays it
/// `rounds_per_setup` times, and tallies the result into standings.
pub struct Tournament {
    config: TournamentConfig,
}

impl Tournament {
    pub fn new(config: TournamentConfig) -> Self {
        Tournament { config }
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// Runs the whole tournament. `pool[i]` is addressed as pool index
    /// `i` in [`RoundResult::participants`] and in the returned standings
    /// (in pool order, not alphabetically or by points).
    pub fn run(&self, pool: Vec<CompiledProgram>) -> Result<TournamentReport, CoreError> {
        self.config.validate(pool.len())?;

        let span = info_span!(
            "tournament",
            pool_size = pool.len(),
            viruses_per_match = self.config.viruses_per_match,
            rounds_per_setup = self.config.rounds_per_setup
        );
        let _enter = span.enter();

        let mut standings: Vec<Standing> = pool
            .iter()
            .map(|p| Standing {
                name: p.name.clone(),
                ..Default::default()
            })
            .collect();

        let mut rounds = Vec::new();
        let subset_match = Match::new(self.config.match_config.clone());

        for subset in (0..pool.len() as ProgramId).combinations(self.config.viruses_per_match) {
            for _ in 0..self.config.rounds_per_setup {
                let programs: Vec<CompiledProgram> =
                    subset.iter().map(|&id| pool[id as usize].clone()).collect();

                let report = subset_match.run(programs, Box::new(NullListener))?;
                record_outcome(&mut standings, &subset, &report.outcome);
                rounds.push(RoundResult {
                    participants: subset.clone(),
                    outcome: report.outcome,
                });
            }
        }

        standings.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));

        Ok(TournamentReport { rounds, standings })
    }

    /// As [`Tournament::run`], but drives every match through the same
    /// listener. Useful for a CLI `tournament` subcommand that wants one
    /// continuous trace of the whole run.
    pub fn run_with_listener(
        &self,
        pool: Vec<CompiledProgram>,
        mut make_listener: impl FnMut() -> Box<dyn MatchListener>,
    ) -> Result<TournamentReport, CoreError> {
        self.config.validate(pool.len())?;

        let mut standings: Vec<Standing> = pool
            .iter()
            .map(|p| Standing {
                name: p.name.clone(),
                ..Default::default()
            })
            .collect();

        let mut rounds = Vec::new();
        let subset_match = Match::new(self.config.match_config.clone());

        for subset in (0..pool.len() as ProgramId).combinations(self.config.viruses_per_match) {
            for _ in 0..self.config.rounds_per_setup {
                let programs: Vec<CompiledProgram> =
                    subset.iter().map(|&id| pool[id as usize].clone()).collect();

                let report = subset_match.run(programs, make_listener())?;
                record_outcome(&mut standings, &subset, &report.outcome);
                rounds.push(RoundResult {
                    participants: subset.clone(),
                    outcome: report.outcome,
                });
            }
        }

        standings.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));

        Ok(TournamentReport { rounds, standings })
    }
}

/// Tallies one match's outcome into the pool-wide standings. `subset[i]`
/// was passed to `Match::run` as its local `ProgramId` `i`, so a local id
/// must be remapped back through `subset` to index `standings`.
fn record_outcome(standings: &mut [Standing], subset: &[ProgramId], outcome: &MatchOutcome) {
    match outcome {
        MatchOutcome::Winner(local_winner) => {
            for (local_id, &pool_id) in subset.iter().enumerate() {
                let standing = &mut standings[pool_id as usize];
                if local_id as ProgramId == *local_winner {
                    standing.wins += 1;
                    standing.points += POINTS_PER_WIN;
                } else {
                    standing.losses += 1;
                }
            }
        }
        MatchOutcome::Tie(local_survivors) => {
            for (local_id, &pool_id) in subset.iter().enumerate() {
                let standing = &mut standings[pool_id as usize];
                if local_survivors.contains(&(local_id as ProgramId)) {
                    standing.ties += 1;
                    standing.points += POINTS_PER_TIE;
                } else {
                    standing.losses += 1;
                }
            }
        }
        MatchOutcome::NoSurvivors => {
            for &pool_id in subset {
                let standing = &mut standings[pool_id as usize];
                standing.ties += 1;
                standing.points += POINTS_PER_TIE;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{encode, Opcode, Parameter};
    use crate::config::MatchConfig;

    fn nop_loop(name: &str) -> CompiledProgram {
        CompiledProgram {
            name: name.to_string(),
            start_offset: 0,
            instructions: vec![encode(Opcode::Jump, 0, Parameter::Literal(0).encode())],
        }
    }

    fn data_cell(name: &str) -> CompiledProgram {
        CompiledProgram {
            name: name.to_string(),
            start_offset: 0,
            instructions: vec![crate::codec::encode_data(0)],
        }
    }

    fn tiny_config() -> TournamentConfig {
        let mut match_config = MatchConfig::default();
        match_config.memory_size = 256;
        match_config.cycles_to_completion = 20;
        match_config.min_program_distance = 0;
        match_config.placement_seed = Some(7);
        TournamentConfig {
            match_config,
            viruses_per_match: 2,
            rounds_per_setup: 2,
        }
    }

    #[test]
    fn a_survivor_always_beats_a_program_that_faults_immediately() {
        let config = tiny_config();
        let tournament = Tournament::new(config);
        let report = tournament
            .run(vec![nop_loop("survivor"), data_cell("suicide")])
            .unwrap();

        let survivor = report.standings.iter().find(|s| s.name == "survivor").unwrap();
        let suicide = report.standings.iter().find(|s| s.name == "suicide").unwrap();
        assert_eq!(survivor.wins, 2);
        assert_eq!(survivor.points, 4);
        assert_eq!(suicide.losses, 2);
        assert_eq!(suicide.points, 0);
        assert_eq!(report.rounds.len(), 2);
    }

    #[test]
    fn three_programs_play_every_pair_once_per_round() {
        let config = tiny_config();
        let tournament = Tournament::new(config);
        let report = tournament
            .run(vec![nop_loop("a"), nop_loop("b"), nop_loop("c")])
            .unwrap();

        // C(3, 2) = 3 pairings, 2 rounds each; every round both participants
        // are still looping when the cycle budget runs out, so it's a tie.
        assert_eq!(report.rounds.len(), 6);
        let total_points: u32 = report.standings.iter().map(|s| s.points).sum();
        assert_eq!(total_points, 6 * 2 * POINTS_PER_TIE);
        assert!(report.standings.iter().all(|s| s.ties == 2 && s.losses == 0));
    }

    #[test]
    fn rejects_a_match_size_bigger_than_the_pool() {
        let mut config = tiny_config();
        config.viruses_per_match = 5;
        let tournament = Tournament::new(config);
        let err = tournament.run(vec![nop_loop("a"), nop_loop("b")]).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
