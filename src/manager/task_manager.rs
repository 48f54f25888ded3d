//! A fixed-capacity, name-indexed registry of [`TaskRunner`]s. Mirrors
//! [`super::ProcessManager`] over the simpler run-to-completion work
//! model, plus the unnamed round-robin `queue_task` §4.4 calls out as
//! a `TaskManager`-only convenience.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{CadenceError, CadenceResult};
use crate::id::WorkId;
use crate::runner::{RunnerState, TaskRunner, TaskRunnerConfig};
use crate::work::TaskRef;

pub struct TaskManager {
    max_runners: usize,
    runners: Mutex<HashMap<String, Arc<TaskRunner>>>,
    next: AtomicUsize,
}

impl TaskManager {
    pub fn new(max_runners: usize) -> Self {
        Self {
            max_runners,
            runners: Mutex::new(HashMap::new()),
            next: AtomicUsize::new(0),
        }
    }

    /// Registers a new, not-yet-started runner under `name`. Fails with
    /// [`CadenceError::DuplicateRunner`] if the name is already taken,
    /// or [`CadenceError::ManagerFull`] if the registry already holds
    /// `max_runners` entries.
    pub fn create_runner(&self, name: impl Into<String>, config: TaskRunnerConfig) -> CadenceResult<()> {
        let name = name.into();
        let mut runners = self.runners.lock().expect("manager mutex poisoned");
        if runners.contains_key(&name) {
            return Err(CadenceError::DuplicateRunner);
        }
        if runners.len() >= self.max_runners {
            return Err(CadenceError::ManagerFull);
        }
        runners.insert(name, TaskRunner::new(config));
        Ok(())
    }

    pub fn runner_count(&self) -> usize {
        self.runners.lock().expect("manager mutex poisoned").len()
    }

    pub fn runner_names(&self) -> Vec<String> {
        self.runners.lock().expect("manager mutex poisoned").keys().cloned().collect()
    }

    fn runner(&self, name: &str) -> Option<Arc<TaskRunner>> {
        self.runners.lock().expect("manager mutex poisoned").get(name).cloned()
    }

    pub fn start_all(&self) {
        let runners: Vec<_> = self.runners.lock().expect("manager mutex poisoned").values().cloned().collect();
        for runner in &runners {
            runner.run();
        }
        for runner in &runners {
            runner.wait_until_started();
        }
    }

    /// Admits `task` onto the named runner.
    pub fn queue_task(&self, runner_name: &str, task: TaskRef) -> CadenceResult<()> {
        self.runner(runner_name).ok_or(CadenceError::UnknownRunner)?.queue_task(task)
    }

    /// Places `task` on the first runner (starting from a rotating
    /// cursor) whose input queue isn't full, without naming one.
    pub fn queue_task_any(&self, task: TaskRef) -> CadenceResult<()> {
        let runners: Vec<_> = self.runners.lock().expect("manager mutex poisoned").values().cloned().collect();
        if runners.is_empty() {
            return Err(CadenceError::UnknownRunner);
        }
        let start = self.next.fetch_add(1, Ordering::Relaxed) % runners.len();

        let mut last_err = CadenceError::QueueFull;
        for offset in 0..runners.len() {
            match runners[(start + offset) % runners.len()].queue_task(task.clone()) {
                Ok(()) => return Ok(()),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }

    pub fn get_task(&self, id: WorkId) -> Option<TaskRef> {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        runners.values().find_map(|runner| runner.get_task(id))
    }

    /// Looks up a task by name, hashing through [`WorkId::from_name`].
    pub fn get_task_by_name(&self, name: &str) -> Option<TaskRef> {
        self.get_task(WorkId::from_name(name))
    }

    pub fn terminate_runner(&self, name: &str) -> CadenceResult<()> {
        self.runner(name).ok_or(CadenceError::UnknownRunner)?.terminate_runner()
    }

    pub fn terminate_all_runners(&self) {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        for runner in runners.values() {
            let _ = runner.terminate_runner();
        }
    }

    pub fn wait_for_termination(&self, name: &str) -> CadenceResult<()> {
        self.runner(name).ok_or(CadenceError::UnknownRunner)?.wait_for_termination();
        Ok(())
    }

    pub fn wait_for_all_terminated(&self) {
        let runners: Vec<_> = self.runners.lock().expect("manager mutex poisoned").values().cloned().collect();
        for runner in &runners {
            runner.wait_for_termination();
        }
    }

    pub fn task_count(&self) -> usize {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        runners
            .values()
            .map(|runner| runner.queued_count() + if runner.has_running_task() { 1 } else { 0 })
            .sum()
    }

    pub fn runner_state(&self, name: &str) -> Option<RunnerState> {
        self.runner(name).map(|runner| runner.state())
    }

    pub fn runner_states(&self) -> Vec<RunnerState> {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        runners.values().map(|runner| runner.state()).collect()
    }
}
