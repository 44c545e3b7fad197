//! A compiled program and its runtime state: the shared registers every
//! thread of that program can see, and the FIFO queue of threads currently
//! alive. Placement (where in memory a program lives) and scheduling
//! (which program gets to step next) belong to [`crate::match_controller`];
//! this module only knows how to run one program's own threads in order.

use crate::constants::{PRIVATE_REGISTER_COUNT, SHARED_REGISTER_COUNT};
use crate::context::ExecutionContext;
use crate::thread::{Thread, ThreadOutcome};
use crate::{Address, ProgramId, Word};
use std::collections::VecDeque;
use tracing::debug;

/// What [`crate::codec`] and the assembler agree a virus compiles down to:
/// a name for reporting, the instruction vector that gets written into
/// memory verbatim, and where within it execution begins.
#[derive(Clone, Debug)]
pub struct CompiledProgram {
    pub name: String,
    pub start_offset: usize,
    pub instructions: Vec<Word>,
}

impl CompiledProgram {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// The result of asking a program to step one of its threads.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ProgramStepOutcome {
    /// The program has no live threads at all; nothing happened.
    Idle,
    /// A thread stepped and the program still has at least one left.
    Progressing,
    /// A thread stepped and it was the program's last one.
    Drained,
}

/// A loaded virus: its immutable instruction vector, its 16 shared
/// registers, and the ordered queue of threads currently executing it.
pub struct Program {
    name: String,
    instructions: Vec<Word>,
    start_offset: usize,
    shared_registers: [Word; SHARED_REGISTER_COUNT],
    threads: VecDeque<Thread>,
}

impl Program {
    pub fn new(compiled: CompiledProgram) -> Self {
        Program {
            name: compiled.name,
            instructions: compiled.instructions,
            start_offset: compiled.start_offset,
            shared_registers: [0; SHARED_REGISTER_COUNT],
            threads: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn live_thread_count(&self) -> usize {
        self.threads.len()
    }

    /// The program's live threads, in FIFO scheduling order. Exposed for
    /// debug tooling and tests; stepping mutates this queue through
    /// [`Program::step`], not through this accessor.
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.iter()
    }

    pub fn shared_registers(&self) -> &[Word; SHARED_REGISTER_COUNT] {
        &self.shared_registers
    }

    /// A program with no live threads has lost the match.
    pub fn is_stopped(&self) -> bool {
        self.threads.is_empty()
    }

    pub(crate) fn shared_register(&self, index0: usize) -> Word {
        self.shared_registers[index0]
    }

    pub(crate) fn set_shared_register(&mut self, index0: usize, value: Word) {
        self.shared_registers[index0] = value;
    }

    /// Bulk-writes this program's instructions into memory starting at
    /// `base`, wrapping as needed. Placement-time only; not attributed to
    /// any thread.
    pub fn write_program(&self, ctx: &mut ExecutionContext, base: Address) {
        ctx.write_program(base, &self.instructions);
    }

    /// Spawns the one thread every program starts a match with, at
    /// `base + start_offset`.
    pub fn spawn_initial(
        &mut self,
        ctx: &mut ExecutionContext,
        base: Address,
        program_id: ProgramId,
    ) -> bool {
        let pc = ctx.wrap(base as i64 + self.start_offset as i64);
        self.create_thread(ctx, pc, [0; PRIVATE_REGISTER_COUNT], program_id)
    }

    /// Tries to bring a new thread into existence at `pc`, copying
    /// `private_registers` as its starting register file (the parent's
    /// registers, for FORK; all zero, for the initial thread). Denied if
    /// the global thread budget is exhausted.
    pub(crate) fn create_thread(
        &mut self,
        ctx: &mut ExecutionContext,
        pc: Address,
        private_registers: [Word; PRIVATE_REGISTER_COUNT],
        program_id: ProgramId,
    ) -> bool {
        if ctx.try_acquire_thread() {
            let id = ctx.new_thread_id();
            self.threads.push_back(Thread::new(id, pc, private_registers));
            ctx.notify_thread_created(program_id, id);
            true
        } else {
            ctx.notify_thread_create_failed(program_id);
            false
        }
    }

    /// Advances this program by exactly one instruction: pops its head
    /// thread, single-steps it, and re-enqueues it at the tail if it
    /// survived (FIFO fairness across a program's own threads).
    pub fn step(&mut self, ctx: &mut ExecutionContext, program_id: ProgramId) -> ProgramStepOutcome {
        let mut thread = match self.threads.pop_front() {
            Some(thread) => thread,
            None => return ProgramStepOutcome::Idle,
        };

        ctx.enter_scope(program_id, thread.id());
        match thread.step(ctx, self, program_id) {
            ThreadOutcome::Survived => self.threads.push_back(thread),
            ThreadOutcome::Terminated(fault) => {
                debug!(program = program_id, thread = thread.id(), %fault, "thread_terminated");
                ctx.notify_thread_terminated(program_id, thread.id());
                ctx.release_thread();
            }
        }

        if self.threads.is_empty() {
            ProgramStepOutcome::Drained
        } else {
            ProgramStepOutcome::Progressing
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn nop_program(name: &str, length: usize) -> CompiledProgram {
        CompiledProgram {
            name: name.to_string(),
            start_offset: 0,
            instructions: vec![crate::codec::encode(crate::codec::Opcode::Nop, 0, 0); length],
        }
    }

    #[test]
    fn spawn_initial_creates_exactly_one_thread() {
        let mut ctx = ExecutionContext::new(256, 10);
        let mut program = Program::new(nop_program("p", 4));
        assert!(program.spawn_initial(&mut ctx, 0, 0));
        assert_eq!(program.live_thread_count(), 1);
        assert!(!program.is_stopped());
    }

    #[test]
    fn spawn_initial_is_denied_once_the_thread_budget_is_spent() {
        let mut ctx = ExecutionContext::new(256, 0);
        let mut program = Program::new(nop_program("p", 4));
        assert!(!program.spawn_initial(&mut ctx, 0, 0));
        assert_eq!(program.live_thread_count(), 0);
    }

    #[test]
    fn stepping_an_idle_program_is_a_no_op() {
        let mut ctx = ExecutionContext::new(256, 10);
        let mut program = Program::new(nop_program("p", 4));
        assert_eq!(program.step(&mut ctx, 0), ProgramStepOutcome::Idle);
    }

    #[test]
    fn a_nop_loop_keeps_progressing_forever() {
        let mut ctx = ExecutionContext::new(256, 10);
        let mut program = Program::new(nop_program("p", 1));
        program.write_program(&mut ctx, 0);
        program.spawn_initial(&mut ctx, 0, 0);
        for _ in 0..10 {
            assert_eq!(program.step(&mut ctx, 0), ProgramStepOutcome::Progressing);
        }
        assert_eq!(program.live_thread_count(), 1);
    }

    #[test]
    fn a_data_cell_drains_the_only_thread() {
        let mut ctx = ExecutionContext::new(256, 10);
        let compiled = CompiledProgram {
            name: "p".to_string(),
            start_offset: 0,
            instructions: vec![crate::codec::encode_data(0)],
        };
        let mut program = Program::new(compiled);
        program.write_program(&mut ctx, 0);
        program.spawn_initial(&mut ctx, 0, 0);
        assert_eq!(program.step(&mut ctx, 0), ProgramStepOutcome::Drained);
        assert!(program.is_stopped());
    }
}
