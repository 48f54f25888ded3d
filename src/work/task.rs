//! `Task`: a short, run-to-completion work unit with no pause/resume and
//! no priority budget. Grounded on
//! `original_source/include/core/threading_OLD/task.h`.

use std::sync::{Arc, Mutex};

use crate::id::WorkId;
use crate::work::header::{TaskHeader, TaskRef};
pub use crate::work::header::TaskState;

pub trait Task: Send {
    fn header(&self) -> &TaskHeader;
    fn header_mut(&mut self) -> &mut TaskHeader;

    /// Run the task to completion. The workload calls
    /// [`Task::succeed`]/[`Task::fail`] before returning; a task that
    /// returns without transitioning is a bug (the task runner treats
    /// it as still not dead and will not re-invoke `run`).
    fn run(&mut self);

    fn on_initialize(&mut self) {}
    fn on_success(&mut self) {}
    fn on_failure(&mut self) {}
    fn on_termination(&mut self) {}

    fn initialize(&mut self) {
        self.header_mut().state = TaskState::Running;
        self.header_mut().initialized = true;
    }

    fn id(&self) -> WorkId {
        self.header().id
    }

    fn name(&self) -> Option<&str> {
        self.header().name.as_deref()
    }

    fn state(&self) -> TaskState {
        self.header().state
    }

    fn is_dead(&self) -> bool {
        self.state().is_dead()
    }

    fn is_initialized(&self) -> bool {
        self.header().initialized
    }

    fn terminate(&mut self) {
        if matches!(self.state(), TaskState::NotStarted | TaskState::Running) {
            self.header_mut().state = TaskState::Terminated;
        }
    }

    fn succeed(&mut self) {
        self.header_mut().state = TaskState::Succeeded;
    }

    fn fail(&mut self) {
        self.header_mut().state = TaskState::Failed;
    }

    fn remove(&mut self) {
        self.header_mut().state = TaskState::Removed;
    }

    fn has_child(&self) -> bool {
        self.header().child.is_some()
    }

    fn parent_id(&self) -> Option<WorkId> {
        self.header().parent_id
    }

    fn attach_child(&mut self, child: TaskRef) {
        self.detach_child();
        {
            let mut child_guard = child.lock().expect("child task mutex poisoned");
            child_guard.header_mut().parent_id = Some(self.id());
        }
        self.header_mut().child = Some(child);
    }

    fn take_child(&mut self) -> Option<TaskRef> {
        let child = self.header_mut().child.take();
        if let Some(child) = &child {
            let mut child_guard = child.lock().expect("child task mutex poisoned");
            child_guard.header_mut().parent_id = None;
        }
        child
    }

    fn detach_child(&mut self) {
        let _ = self.take_child();
    }

    fn child(&self) -> Option<TaskRef> {
        self.header().child.clone()
    }
}

pub fn new_task_ref<T: Task + 'static>(task: T) -> TaskRef {
    Arc::new(Mutex::new(task))
}
