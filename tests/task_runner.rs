//! FIFO-on-TaskRunner property from spec.md §8.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cadence::runner::{TaskRunner, TaskRunnerConfig};
use cadence::work::header::TaskHeader;
use cadence::work::{new_task_ref, Task};

struct OrderedTask {
    header: TaskHeader,
    label: &'static str,
    order: Arc<Mutex<Vec<&'static str>>>,
}

impl Task for OrderedTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }
    fn run(&mut self) {
        self.order.lock().expect("order mutex poisoned").push(self.label);
        self.succeed();
    }
}

fn wait_until(mut predicate: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

#[test]
fn tasks_run_in_fifo_order() {
    let runner = TaskRunner::new(TaskRunnerConfig::default());
    runner.run();
    runner.wait_until_started();

    let order = Arc::new(Mutex::new(Vec::new()));
    for label in ["a", "b", "c"] {
        let task = new_task_ref(OrderedTask {
            header: TaskHeader::named(label),
            label,
            order: order.clone(),
        });
        runner.queue_task(task).expect("should admit");
    }

    assert!(wait_until(
        || order.lock().expect("order mutex poisoned").len() == 3,
        Duration::from_secs(2)
    ));
    assert_eq!(*order.lock().expect("order mutex poisoned"), vec!["a", "b", "c"]);

    runner.terminate_runner().expect("should accept shutdown");
    runner.wait_for_termination();
}

struct BlockingTask {
    header: TaskHeader,
    release: Arc<Mutex<bool>>,
    done: Arc<Mutex<bool>>,
}

impl Task for BlockingTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }
    fn run(&mut self) {
        loop {
            if *self.release.lock().expect("release mutex poisoned") {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        *self.done.lock().expect("done mutex poisoned") = true;
        self.succeed();
    }
}

#[test]
fn second_task_waits_for_first_to_finish() {
    let runner = TaskRunner::new(TaskRunnerConfig::default());
    runner.run();
    runner.wait_until_started();

    let release = Arc::new(Mutex::new(false));
    let first_done = Arc::new(Mutex::new(false));
    let first = new_task_ref(BlockingTask {
        header: TaskHeader::named("first"),
        release: release.clone(),
        done: first_done.clone(),
    });
    runner.queue_task(first).expect("should admit");

    let order = Arc::new(Mutex::new(Vec::new()));
    let second = new_task_ref(OrderedTask {
        header: TaskHeader::named("second"),
        label: "second",
        order: order.clone(),
    });
    runner.queue_task(second).expect("should admit");

    // Give the runner a chance to start the first task and confirm the
    // second hasn't run yet while the first is still blocked.
    std::thread::sleep(Duration::from_millis(50));
    assert!(order.lock().expect("order mutex poisoned").is_empty());

    *release.lock().expect("release mutex poisoned") = true;

    assert!(wait_until(
        || *first_done.lock().expect("done mutex poisoned"),
        Duration::from_secs(2)
    ));
    assert!(wait_until(
        || !order.lock().expect("order mutex poisoned").is_empty(),
        Duration::from_secs(2)
    ));

    runner.terminate_runner().expect("should accept shutdown");
    runner.wait_for_termination();
}
