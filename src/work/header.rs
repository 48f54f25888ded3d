//! Fields shared by every `Process` and every `Task`: identity, name,
//! state, and the parent/child edge. Concrete work units embed a header
//! and expose it through `Process::header`/`header_mut` (or the `Task`
//! equivalents) so the default trait methods can operate on it — the
//! Rust stand-in for the C++ base class's private fields in
//! `process.h`/`task.h`.

use std::sync::{Arc, Mutex};

use crate::id::WorkId;

/// `ProcessState` mirrors `Process::ProcessState` in the original:
/// `NotStarted -> Running <-> Paused -> {Terminated|Succeeded|Failed}
/// -> WillBeRemoved -> Removed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    Running,
    Paused,
    Terminated,
    Succeeded,
    Failed,
    WillBeRemoved,
    Removed,
}

impl ProcessState {
    pub fn is_alive(self) -> bool {
        matches!(self, ProcessState::Running | ProcessState::Paused)
    }

    pub fn is_dead(self) -> bool {
        matches!(
            self,
            ProcessState::Succeeded
                | ProcessState::Failed
                | ProcessState::Terminated
                | ProcessState::WillBeRemoved
        )
    }
}

/// `TaskState` mirrors the simpler task lifecycle: no pause/resume, no
/// `WillBeRemoved` deferral step (tasks are reclaimed synchronously).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    NotStarted,
    Running,
    Terminated,
    Succeeded,
    Failed,
    Removed,
}

impl TaskState {
    pub fn is_dead(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Terminated
        )
    }
}

pub type ProcessRef = Arc<Mutex<dyn crate::work::Process>>;
pub type TaskRef = Arc<Mutex<dyn crate::work::Task>>;

/// Shared header embedded by every concrete `Process`.
///
/// The parent link is stored as a [`WorkId`] rather than a `Weak`
/// pointer to the parent's `Arc`: a work unit's own default trait
/// methods never need to dereference their parent directly (only the
/// runner does, via its id index), so an id is a sufficiently "weak,
/// non-owning" back-reference and sidesteps the self-referential-Arc
/// problem `Process::attach_child` would otherwise have.
pub struct ProcessHeader {
    pub(crate) id: WorkId,
    pub(crate) name: Option<String>,
    pub(crate) priority: i32,
    pub(crate) priority_modifier: i32,
    pub(crate) state: ProcessState,
    pub(crate) initialized: bool,
    pub(crate) parent_id: Option<WorkId>,
    pub(crate) child: Option<ProcessRef>,
}

impl ProcessHeader {
    pub fn new(id: WorkId, name: impl Into<Option<String>>) -> Self {
        Self {
            id,
            name: name.into(),
            priority: 1,
            priority_modifier: 1,
            state: ProcessState::NotStarted,
            initialized: false,
            parent_id: None,
            child: None,
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(WorkId::from_name(name), name.to_string())
    }
}

pub struct TaskHeader {
    pub(crate) id: WorkId,
    pub(crate) name: Option<String>,
    pub(crate) state: TaskState,
    pub(crate) initialized: bool,
    pub(crate) parent_id: Option<WorkId>,
    pub(crate) child: Option<TaskRef>,
}

impl TaskHeader {
    pub fn new(id: WorkId, name: impl Into<Option<String>>) -> Self {
        Self {
            id,
            name: name.into(),
            state: TaskState::NotStarted,
            initialized: false,
            parent_id: None,
            child: None,
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(WorkId::from_name(name), name.to_string())
    }
}
