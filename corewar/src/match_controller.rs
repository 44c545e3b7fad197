//! One run of the VM over a fixed set of compiled programs: placement,
//! the round-robin cycle loop, and winner determination. Composed
//! repeatedly, with different program subsets, by [`crate::tournament::Tournament`].

use crate::config::MatchConfig;
use crate::context::ExecutionContext;
use crate::error::CoreError;
use crate::listener::MatchListener;
use crate::program::{CompiledProgram, Program, ProgramStepOutcome};
use crate::ProgramId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::info_span;

/// How a match ended, in terms of the [`ProgramId`]s supplied to
/// [`Match::run`] (indices into the `Vec<CompiledProgram>` passed in, in
/// the order given, not placement order).
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum MatchOutcome {
    /// Exactly one program still had a live thread when the match ended.
    Winner(ProgramId),
    /// More than one program still had a live thread; a draw among them.
    Tie(Vec<ProgramId>),
    /// Every program had lost all its threads by the time the match ended.
    NoSurvivors,
}

/// The result of one full run: how it ended, and how many cycles it took
/// (fewer than `cycles_to_completion` if the active-program queue drained
/// early).
#[derive(Clone, Debug)]
pub struct MatchReport {
    pub outcome: MatchOutcome,
    pub cycles_run: u64,
}

/// Drives one match: validates a [`MatchConfig`] against the program
/// count, places the programs in a freshly created [`ExecutionContext`],
/// and runs the round-robin cycle loop to completion.
pub struct Match {
    config: MatchConfig,
}

impl Match {
    pub fn new(config: MatchConfig) -> Self {
        Match { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Runs the match to completion. `compiled[i]` is addressed as
    /// [`ProgramId`] `i` throughout the returned report and in listener
    /// callbacks.
    pub fn run(
        &self,
        compiled: Vec<CompiledProgram>,
        listener: Box<dyn MatchListener>,
    ) -> Result<MatchReport, CoreError> {
        self.config.validate(compiled.len())?;
        for program in &compiled {
            if program.len() > self.config.max_program_length {
                return Err(CoreError::ProgramTooLong {
                    name: program.name.clone(),
                    length: program.len(),
                    max: self.config.max_program_length,
                });
            }
        }

        let program_count = compiled.len();
        let total_length: usize = compiled.iter().map(CompiledProgram::len).sum();
        let free_per = match self.config.memory_size.checked_sub(total_length) {
            Some(free) if program_count > 0 => free / program_count,
            _ => 0,
        };
        if program_count > 0 && free_per < self.config.min_program_distance {
            return Err(CoreError::InsufficientDistance {
                programs: program_count,
                total_length,
                memory_size: self.config.memory_size,
                min_distance: self.config.min_program_distance,
            });
        }

        let span = info_span!("match", programs = program_count, memory_size = self.config.memory_size);
        let _enter = span.enter();

        let mut ctx = ExecutionContext::with_listener(self.config.memory_size, self.config.max_threads, listener);
        let mut programs: Vec<Program> = compiled.into_iter().map(Program::new).collect();

        let mut placement_order: Vec<ProgramId> = (0..program_count as ProgramId).collect();
        let mut rng = StdRng::seed_from_u64(self.config.resolved_seed());
        placement_order.shuffle(&mut rng);

        let mut active: VecDeque<ProgramId> = VecDeque::with_capacity(program_count);
        let mut base: usize = 0;
        for (placement_index, &program_id) in placement_order.iter().enumerate() {
            if placement_index > 0 {
                let slack = free_per - self.config.min_program_distance;
                let advance = self.config.min_program_distance + if slack > 0 { rng.gen_range(0..=slack) } else { 0 };
                base = ctx.wrap(base as i64 + advance as i64);
            }

            let program = &mut programs[program_id as usize];
            ctx.notify_program_added(program_id, program.name());
            program.write_program(&mut ctx, base);
            program.spawn_initial(&mut ctx, base, program_id);
            active.push_back(program_id);
        }

        ctx.notify_execution_started();

        let mut cycles_run = 0u64;
        while cycles_run < self.config.cycles_to_completion {
            let program_id = match active.pop_front() {
                Some(id) => id,
                None => break,
            };
            match programs[program_id as usize].step(&mut ctx, program_id) {
                ProgramStepOutcome::Progressing => active.push_back(program_id),
                ProgramStepOutcome::Drained | ProgramStepOutcome::Idle => {}
            }
            cycles_run += 1;
        }

        ctx.notify_execution_completed();

        let survivors: Vec<ProgramId> = (0..program_count as ProgramId)
            .filter(|&id| !programs[id as usize].is_stopped())
            .collect();

        let outcome = match survivors.len() {
            0 => MatchOutcome::NoSurvivors,
            1 => MatchOutcome::Winner(survivors[0]),
            _ => MatchOutcome::Tie(survivors),
        };

        Ok(MatchReport { outcome, cycles_run })
    }
}
