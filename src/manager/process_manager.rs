//! A fixed-capacity, name-indexed registry of [`ProcessRunner`]s.
//!
//! Grounded on §4.4: `create_runner(name, queue_size)` fails if the name
//! is already taken or the registry is full; `queue_process` and the
//! targeted control calls dispatch straight to the named runner; the
//! by-id calls (`get_process`, `pause_process`, `resume_process`,
//! `terminate_process`) scan every runner, since a caller typically
//! only has the work unit's id, not which runner hosts it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{CadenceError, CadenceResult};
use crate::id::WorkId;
use crate::runner::{ProcessRunner, ProcessRunnerConfig, RunnerState};
use crate::work::ProcessRef;

pub struct ProcessManager {
    max_runners: usize,
    runners: Mutex<HashMap<String, Arc<ProcessRunner>>>,
}

impl ProcessManager {
    pub fn new(max_runners: usize) -> Self {
        Self {
            max_runners,
            runners: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a new, not-yet-started runner under `name`. Fails with
    /// [`CadenceError::DuplicateRunner`] if the name is already taken,
    /// or [`CadenceError::ManagerFull`] if the registry already holds
    /// `max_runners` entries.
    pub fn create_runner(&self, name: impl Into<String>, config: ProcessRunnerConfig) -> CadenceResult<()> {
        let name = name.into();
        let mut runners = self.runners.lock().expect("manager mutex poisoned");
        if runners.contains_key(&name) {
            return Err(CadenceError::DuplicateRunner);
        }
        if runners.len() >= self.max_runners {
            return Err(CadenceError::ManagerFull);
        }
        runners.insert(name, ProcessRunner::new(config));
        Ok(())
    }

    pub fn runner_count(&self) -> usize {
        self.runners.lock().expect("manager mutex poisoned").len()
    }

    pub fn runner_names(&self) -> Vec<String> {
        self.runners.lock().expect("manager mutex poisoned").keys().cloned().collect()
    }

    fn runner(&self, name: &str) -> Option<Arc<ProcessRunner>> {
        self.runners.lock().expect("manager mutex poisoned").get(name).cloned()
    }

    /// Spawns every runner in the registry that hasn't started yet.
    pub fn start_all(&self) {
        let runners: Vec<_> = self.runners.lock().expect("manager mutex poisoned").values().cloned().collect();
        for runner in &runners {
            runner.run();
        }
        for runner in &runners {
            runner.wait_until_started();
        }
    }

    /// Admits `process` onto the named runner.
    pub fn queue_process(&self, runner_name: &str, process: ProcessRef) -> CadenceResult<()> {
        self.runner(runner_name).ok_or(CadenceError::UnknownRunner)?.queue_process(process)
    }

    /// Looks up a process by id by scanning every runner.
    pub fn get_process(&self, id: WorkId) -> Option<ProcessRef> {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        runners.values().find_map(|runner| runner.get_process(id))
    }

    /// Looks up a process by name, hashing through [`WorkId::from_name`]
    /// the same way the original's `getProcess(const Char*)` overload
    /// forwards to its id-keyed lookup.
    pub fn get_process_by_name(&self, name: &str) -> Option<ProcessRef> {
        self.get_process(WorkId::from_name(name))
    }

    fn runner_hosting(&self, id: WorkId) -> Option<Arc<ProcessRunner>> {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        runners.values().find(|runner| runner.get_process(id).is_some()).cloned()
    }

    pub fn pause_process(&self, id: WorkId) -> CadenceResult<()> {
        self.runner_hosting(id).ok_or(CadenceError::UnknownRunner)?.pause_process(id)
    }

    pub fn resume_process(&self, id: WorkId) -> CadenceResult<()> {
        self.runner_hosting(id).ok_or(CadenceError::UnknownRunner)?.resume_process(id)
    }

    pub fn terminate_process(&self, id: WorkId) -> CadenceResult<()> {
        self.runner_hosting(id).ok_or(CadenceError::UnknownRunner)?.terminate_process(id)
    }

    /// Terminates only the named runner, leaving the rest of the
    /// registry running.
    pub fn terminate_runner(&self, name: &str) -> CadenceResult<()> {
        self.runner(name).ok_or(CadenceError::UnknownRunner)?.terminate_runner()
    }

    pub fn terminate_all_runners(&self) {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        for runner in runners.values() {
            let _ = runner.terminate_runner();
        }
    }

    /// Blocks until the named runner has reached `Terminated`.
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

    pub fn process_count(&self) -> usize {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        runners.values().map(|runner| runner.process_count()).sum()
    }

    pub fn runner_state(&self, name: &str) -> Option<RunnerState> {
        self.runner(name).map(|runner| runner.state())
    }

    pub fn runner_states(&self) -> Vec<RunnerState> {
        let runners = self.runners.lock().expect("manager mutex poisoned");
        runners.values().map(|runner| runner.state()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::header::ProcessHeader;
    use crate::work::{new_process_ref, Process};

    struct NoopProcess {
        header: ProcessHeader,
    }

    impl Process for NoopProcess {
        fn header(&self) -> &ProcessHeader {
            &self.header
        }
        fn header_mut(&mut self) -> &mut ProcessHeader {
            &mut self.header
        }
        fn run(&mut self, _budget: u32) {
            self.succeed();
        }
    }

    #[test]
    fn create_runner_respects_capacity_and_uniqueness() {
        let manager = ProcessManager::new(1);
        manager.create_runner("pm1", ProcessRunnerConfig::default()).unwrap();
        assert!(matches!(
            manager.create_runner("pm1", ProcessRunnerConfig::default()),
            Err(CadenceError::DuplicateRunner)
        ));
        assert!(matches!(
            manager.create_runner("pm2", ProcessRunnerConfig::default()),
            Err(CadenceError::ManagerFull)
        ));
    }

    #[test]
    fn targeted_terminate_leaves_other_runners_alone() {
        let manager = ProcessManager::new(2);
        manager.create_runner("pm1", ProcessRunnerConfig::default()).unwrap();
        manager.create_runner("pm2", ProcessRunnerConfig::default()).unwrap();
        manager.start_all();

        let p1 = new_process_ref(NoopProcess {
            header: ProcessHeader::named("p1"),
        });
        let p2 = new_process_ref(NoopProcess {
            header: ProcessHeader::named("p2"),
        });
        manager.queue_process("pm1", p1).expect("should admit");
        manager.queue_process("pm2", p2).expect("should admit");

        manager.terminate_runner("pm1").expect("should accept shutdown");
        manager.wait_for_termination("pm1").expect("pm1 should be known");

        assert_eq!(manager.runner_state("pm1"), Some(RunnerState::Terminated));
        assert_ne!(manager.runner_state("pm2"), Some(RunnerState::Terminated));

        manager.terminate_all_runners();
        manager.wait_for_all_terminated();
    }

    #[test]
    fn unknown_runner_name_is_a_typed_error() {
        let manager = ProcessManager::new(1);
        let process = new_process_ref(NoopProcess {
            header: ProcessHeader::named("p"),
        });
        assert!(matches!(
            manager.queue_process("missing", process),
            Err(CadenceError::UnknownRunner)
        ));
        assert!(matches!(
            manager.terminate_runner("missing"),
            Err(CadenceError::UnknownRunner)
        ));
    }
}
