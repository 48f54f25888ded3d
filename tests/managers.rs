//! Manager targeted control — spec.md §8 scenario 6.

use std::time::Duration;

use cadence::error::CadenceError;
use cadence::manager::{ProcessManager, TaskManager};
use cadence::runner::{ProcessRunnerConfig, RunnerState, TaskRunnerConfig};
use cadence::work::header::{ProcessHeader, TaskHeader};
use cadence::work::{new_process_ref, new_task_ref, Process, Task};

struct LongLivedProcess {
    header: ProcessHeader,
}

impl Process for LongLivedProcess {
    fn header(&self) -> &ProcessHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut ProcessHeader {
        &mut self.header
    }
    fn run(&mut self, _budget: u32) {}
}

#[test]
fn terminate_runner_targets_one_runner_in_the_fleet() {
    let manager = ProcessManager::new(2);
    manager
        .create_runner(
            "pm1",
            ProcessRunnerConfig {
                input_queue_size: 4,
                ..ProcessRunnerConfig::default()
            },
        )
        .expect("pm1 should register");
    manager
        .create_runner(
            "pm2",
            ProcessRunnerConfig {
                input_queue_size: 32,
                ..ProcessRunnerConfig::default()
            },
        )
        .expect("pm2 should register");
    manager.start_all();

    let p1 = new_process_ref(LongLivedProcess {
        header: ProcessHeader::named("p1"),
    });
    let p2 = new_process_ref(LongLivedProcess {
        header: ProcessHeader::named("p2"),
    });
    manager.queue_process("pm1", p1).expect("p1 should be admitted onto pm1");
    manager.queue_process("pm2", p2).expect("p2 should be admitted onto pm2");

    manager.terminate_runner("pm1").expect("pm1 should accept shutdown");
    manager
        .wait_for_termination("pm1")
        .expect("pm1 should be a known runner");

    assert_eq!(manager.runner_state("pm1"), Some(RunnerState::Terminated));
    assert_eq!(manager.runner_state("pm2"), Some(RunnerState::Running));

    manager.terminate_all_runners();
    manager.wait_for_all_terminated();
}

struct NoopTask {
    header: TaskHeader,
}

impl Task for NoopTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }
    fn run(&mut self) {
        self.succeed();
    }
}

#[test]
fn duplicate_runner_name_is_rejected_without_state_change() {
    let manager = TaskManager::new(1);
    manager
        .create_runner("tm1", TaskRunnerConfig::default())
        .expect("tm1 should register");

    assert!(matches!(
        manager.create_runner("tm1", TaskRunnerConfig::default()),
        Err(CadenceError::DuplicateRunner)
    ));
    assert_eq!(manager.runner_count(), 1);
}

#[test]
fn queue_task_any_round_robins_when_no_name_is_given() {
    let manager = TaskManager::new(2);
    manager.create_runner("tm1", TaskRunnerConfig::default()).unwrap();
    manager.create_runner("tm2", TaskRunnerConfig::default()).unwrap();
    manager.start_all();

    for label in ["t1", "t2", "t3", "t4"] {
        let task = new_task_ref(NoopTask {
            header: TaskHeader::named(label),
        });
        manager.queue_task_any(task).expect("should admit");
    }

    std::thread::sleep(Duration::from_millis(100));
    manager.terminate_all_runners();
    manager.wait_for_all_terminated();
}
