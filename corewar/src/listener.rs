//! The observable event stream a running match produces. Every callback is
//! synchronous and informational: a listener is never consulted to decide
//! anything and must never mutate VM state from inside a callback. A
//! match that has no listener attached runs identically to one that does.

use crate::{Address, ProgramId, ThreadId};

/// Programmatic observer of a match in progress: what a replay recorder
/// or a step debugger hooks into. Every method has a no-op default, so
/// implementers only override the events they care about.
pub trait MatchListener {
    fn on_program_added(&mut self, _program: ProgramId, _name: &str) {}
    fn on_execution_started(&mut self, _memory_snapshot: &[u32]) {}
    fn on_execution_completed(&mut self) {}
    fn on_thread_created(&mut self, _program: ProgramId, _thread: ThreadId) {}
    fn on_thread_create_failed(&mut self, _program: ProgramId) {}
    fn on_thread_terminated(&mut self, _program: ProgramId, _thread: ThreadId) {}
    fn on_mem_read(&mut self, _program: ProgramId, _thread: ThreadId, _addr: Address) {}
    fn on_mem_write(&mut self, _program: ProgramId, _thread: ThreadId, _addr: Address) {}
    fn on_fetch_instruction(&mut self, _program: ProgramId, _thread: ThreadId, _addr: Address) {}
}

/// A listener that does nothing; the default when a caller attaches none.
/// Every callback is also mirrored as a `tracing` event at the relevant
/// call site, so observability does not depend on a listener being wired
/// up at all.
#[derive(Default)]
pub struct NullListener;

impl MatchListener for NullListener {}
