//! `Process`: a long-lived, resumable, priority-weighted work unit.
//!
//! Grounded on `original_source/include/core/threading/process.h` — the
//! method names below (`pause`, `resume`, `terminate`, `markForRemoval`,
//! `getRequestedRunTime`, `attachChild`/`takeChild`/`detachChild`) are a
//! direct translation of that interface's public surface into a Rust
//! trait with default bodies, per §9's "interface (capability set)"
//! re-architecture note.

use std::sync::{Arc, Mutex};

use crate::id::WorkId;
use crate::work::header::{ProcessHeader, ProcessRef};
pub use crate::work::header::ProcessState;

/// Implemented by every process that runs on a [`crate::runner::ProcessRunner`].
///
/// Only [`Process::run`] and the header accessors are required; the
/// `on_*` lifecycle hooks default to no-ops exactly as the original's
/// virtual methods do (`virtual void onSuccess() {}`), and the
/// state-machine mutators (`pause`, `resume`, `terminate`, ...) are
/// provided so a workload never has to reimplement the transition
/// guards.
pub trait Process: Send {
    fn header(&self) -> &ProcessHeader;
    fn header_mut(&mut self) -> &mut ProcessHeader;

    /// Run the process for (up to) `budget` units of time. The workload
    /// is expected to call [`Process::succeed`], [`Process::fail`], or
    /// nothing at all (still alive, ticked again next sweep) before
    /// returning.
    fn run(&mut self, budget: u32);

    fn on_initialize(&mut self) {}
    fn on_pause(&mut self) {}
    fn on_resume(&mut self) {}
    fn on_success(&mut self) {}
    fn on_failure(&mut self) {}
    fn on_termination(&mut self) {}

    /// Called by the runner exactly once, before the first `run`.
    fn initialize(&mut self) {
        self.header_mut().state = ProcessState::Running;
        self.header_mut().initialized = true;
    }

    fn id(&self) -> WorkId {
        self.header().id
    }

    fn name(&self) -> Option<&str> {
        self.header().name.as_deref()
    }

    fn priority(&self) -> i32 {
        self.header().priority
    }

    fn set_priority(&mut self, priority: i32) {
        self.header_mut().priority = priority;
    }

    fn priority_modifier(&self) -> i32 {
        self.header().priority_modifier
    }

    fn set_priority_modifier(&mut self, modifier: i32) {
        self.header_mut().priority_modifier = modifier;
    }

    /// `effective_budget = base_budget * priority * modifier`, saturating
    /// rather than wrapping or panicking on overflow. Per §9's open
    /// question, this product is a scheduling *weight*, not a wall-clock
    /// duration bound.
    fn requested_run_time(&self, base_budget: u32) -> u32 {
        let priority = self.priority().max(0) as u32;
        let modifier = self.priority_modifier().max(0) as u32;
        base_budget.saturating_mul(priority).saturating_mul(modifier)
    }

    fn state(&self) -> ProcessState {
        self.header().state
    }

    fn is_alive(&self) -> bool {
        self.state().is_alive()
    }

    fn is_dead(&self) -> bool {
        self.state().is_dead()
    }

    fn is_initialized(&self) -> bool {
        self.header().initialized
    }

    fn is_paused(&self) -> bool {
        self.state() == ProcessState::Paused
    }

    /// `Running -> Paused`. No-op from any other state.
    fn pause(&mut self) {
        if self.state() == ProcessState::Running {
            self.header_mut().state = ProcessState::Paused;
        }
    }

    /// `Paused -> Running`. No-op from any other state.
    fn resume(&mut self) {
        if self.state() == ProcessState::Paused {
            self.header_mut().state = ProcessState::Running;
        }
    }

    /// `{NotStarted, Running, Paused} -> Terminated`. No-op once dead.
    fn terminate(&mut self) {
        if matches!(
            self.state(),
            ProcessState::NotStarted | ProcessState::Running | ProcessState::Paused
        ) {
            self.header_mut().state = ProcessState::Terminated;
        }
    }

    /// Workload-invoked: marks this process successfully complete.
    fn succeed(&mut self) {
        self.header_mut().state = ProcessState::Succeeded;
    }

    /// Workload-invoked: marks this process as failed.
    fn fail(&mut self) {
        self.header_mut().state = ProcessState::Failed;
    }

    /// Unconditional; only the runner calls this, once, during the
    /// deferred-reclamation handoff.
    fn mark_for_removal(&mut self) {
        self.header_mut().state = ProcessState::WillBeRemoved;
    }

    /// Unconditional; only the runner calls this, once, during slot
    /// reclamation.
    fn remove(&mut self) {
        self.header_mut().state = ProcessState::Removed;
    }

    fn has_child(&self) -> bool {
        self.header().child.is_some()
    }

    fn parent_id(&self) -> Option<WorkId> {
        self.header().parent_id
    }

    /// Attach an owned child. A previously attached child (if any) is
    /// detached and dropped, matching `attachChild`'s overwrite
    /// semantics in the original.
    fn attach_child(&mut self, child: ProcessRef) {
        self.detach_child();
        {
            let mut child_guard = child.lock().expect("child process mutex poisoned");
            child_guard.header_mut().parent_id = Some(self.id());
        }
        self.header_mut().child = Some(child);
    }

    /// Transfers ownership of the child out, clearing both links.
    fn take_child(&mut self) -> Option<ProcessRef> {
        let child = self.header_mut().child.take();
        if let Some(child) = &child {
            let mut child_guard = child.lock().expect("child process mutex poisoned");
            child_guard.header_mut().parent_id = None;
        }
        child
    }

    /// Drops the child, clearing both links.
    fn detach_child(&mut self) {
        let _ = self.take_child();
    }

    fn child(&self) -> Option<ProcessRef> {
        self.header().child.clone()
    }
}

/// Convenience constructor for process references.
pub fn new_process_ref<P: Process + 'static>(process: P) -> ProcessRef {
    Arc::new(Mutex::new(process))
}
