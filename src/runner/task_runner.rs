//! Serial, run-to-completion scheduler for short-lived [`Task`] work
//! units: one task runs at a time, queued tasks wait in FIFO order.
//!
//! Grounded on
//! `original_source/include/core/threading_OLD/taskrunner.h`: a single
//! `m_running` slot rather than a full arena (a task never pauses, so
//! there's nothing to round-robin between), a bounded FIFO of queued
//! tasks, and the same `sync_lock` + bounded message queue pattern as
//! [`crate::runner::ProcessRunner`].

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::error::{CadenceError, CadenceResult};
use crate::id::WorkId;
use crate::queue::BoundedQueue;
use crate::retries::ExponentialBackoffDecider;
use crate::runner::RunnerState;
use crate::synca::{AbortIfPanic, IdleState, Idleman, LockSignal};
use crate::work::{Task, TaskRef, TaskState};

const MAX_IDLE_BACKOFFS: u32 = 8;
const MAX_IDLE_WAIT: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug)]
pub struct TaskRunnerConfig {
    /// Depth of the FIFO queue of tasks waiting for their turn.
    pub queue_size: usize,
    pub message_queue_size: usize,
}

impl Default for TaskRunnerConfig {
    fn default() -> Self {
        Self {
            queue_size: 128,
            message_queue_size: 32,
        }
    }
}

enum TaskMessage {
    ClearWaiting,
    TerminateRunner,
}

struct Shared {
    running: Option<TaskRef>,
    queued: VecDeque<TaskRef>,
    queue_capacity: usize,
    message_queue: BoundedQueue<TaskMessage>,
    state: RunnerState,
}

impl Shared {
    fn has_queued(&self) -> bool {
        !self.queued.is_empty()
    }

    fn has_running_task(&self) -> bool {
        self.running.is_some()
    }

    fn is_idle(&self) -> bool {
        !self.has_running_task() && !self.has_queued() && self.message_queue.is_empty()
    }
}

/// A single background thread running at most one task at a time,
/// draining a FIFO queue of waiting tasks.
pub struct TaskRunner {
    shared: Mutex<Shared>,
    condvar: Condvar,
    wake: LockSignal,
    idle: Mutex<Idleman>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskRunner {
    pub fn new(config: TaskRunnerConfig) -> Arc<Self> {
        Arc::new(Self {
            shared: Mutex::new(Shared {
                running: None,
                queued: VecDeque::with_capacity(config.queue_size),
                queue_capacity: config.queue_size,
                message_queue: BoundedQueue::with_capacity(config.message_queue_size),
                state: RunnerState::NotStarted,
            }),
            condvar: Condvar::new(),
            wake: LockSignal::new(),
            idle: Mutex::new(Idleman::new(
                MAX_IDLE_BACKOFFS,
                ExponentialBackoffDecider::from_duration(Duration::from_millis(1), MAX_IDLE_WAIT),
            )),
            handle: Mutex::new(None),
        })
    }

    pub fn run(self: &Arc<Self>) {
        {
            let shared = self.shared.lock().expect("runner mutex poisoned");
            if shared.state != RunnerState::NotStarted {
                return;
            }
        }

        let this = Arc::clone(self);
        let join = thread::Builder::new()
            .name("cadence-task-runner".into())
            .spawn(move || this.processing_loop())
            .expect("failed to spawn task runner thread");

        *self.handle.lock().expect("runner mutex poisoned") = Some(join);
    }

    pub fn state(&self) -> RunnerState {
        self.shared.lock().expect("runner mutex poisoned").state
    }

    pub fn has_running_task(&self) -> bool {
        self.shared.lock().expect("runner mutex poisoned").has_running_task()
    }

    pub fn queued_count(&self) -> usize {
        self.shared.lock().expect("runner mutex poisoned").queued.len()
    }

    pub fn get_task(&self, id: WorkId) -> Option<TaskRef> {
        let shared = self.shared.lock().expect("runner mutex poisoned");
        if let Some(running) = &shared.running {
            if running.lock().expect("task mutex poisoned").id() == id {
                return Some(running.clone());
            }
        }
        shared
            .queued
            .iter()
            .find(|task| task.lock().expect("task mutex poisoned").id() == id)
            .cloned()
    }

    pub fn queue_task(&self, task: TaskRef) -> CadenceResult<()> {
        let mut shared = self.shared.lock().expect("runner mutex poisoned");
        if !shared.state.is_usable() {
            return Err(CadenceError::RunnerNotUsable(shared.state));
        }
        if shared.queued.len() >= shared.queue_capacity {
            return Err(CadenceError::QueueFull);
        }
        shared.queued.push_back(task);
        drop(shared);
        self.condvar.notify_all();
        self.wake.signal_all();
        Ok(())
    }

    /// Drops every task still waiting in the queue without running it.
    /// The task currently running (if any) is unaffected.
    pub fn clear_waiting(&self) -> CadenceResult<()> {
        self.post_message(TaskMessage::ClearWaiting)
    }

    pub fn terminate_runner(&self) -> CadenceResult<()> {
        self.post_message(TaskMessage::TerminateRunner)
    }

    fn post_message(&self, message: TaskMessage) -> CadenceResult<()> {
        let mut shared = self.shared.lock().expect("runner mutex poisoned");
        if !shared.state.is_usable() {
            return Err(CadenceError::RunnerNotUsable(shared.state));
        }
        shared
            .message_queue
            .push(message)
            .map_err(|_| CadenceError::QueueFull)?;
        drop(shared);
        self.condvar.notify_all();
        self.wake.signal_all();
        Ok(())
    }

    pub fn wait_until_started(&self) {
        let shared = self.shared.lock().expect("runner mutex poisoned");
        let _unused = self
            .condvar
            .wait_while(shared, |s| s.state == RunnerState::NotStarted)
            .expect("runner mutex poisoned");
    }

    pub fn wait_for_termination(&self) {
        let shared = self.shared.lock().expect("runner mutex poisoned");
        let _unused = self
            .condvar
            .wait_while(shared, |s| s.state != RunnerState::Terminated)
            .expect("runner mutex poisoned");
        if let Some(join) = self.handle.lock().expect("runner mutex poisoned").take() {
            let _ = join.join();
        }
    }

    fn processing_loop(self: Arc<Self>) {
        let _abort_on_panic = AbortIfPanic;

        {
            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            shared.state = RunnerState::Running;
        }
        self.condvar.notify_all();
        debug!("task runner started");

        loop {
            {
                let shared = self.shared.lock().expect("runner mutex poisoned");
                if shared.state == RunnerState::Running && shared.is_idle() {
                    // Armed while still holding `shared`, same as the
                    // process runner: a producer must also take this lock
                    // to push work, so no signal can land unobserved.
                    self.wake.try_lock();
                    drop(shared);
                    self.park_until_woken();
                    continue;
                }

                let drained = !shared.has_running_task() && !shared.has_queued();
                if shared.state != RunnerState::Running && drained {
                    break;
                }
            }

            self.process_messages();
            self.run_next_task();
        }

        {
            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            shared.state = RunnerState::Terminated;
        }
        self.condvar.notify_all();
        debug!("task runner terminated");
    }

    /// Backs off in bounded, jittered steps while nothing is runnable,
    /// then parks indefinitely on [`LockSignal::wait`] once the backoff
    /// budget (`idle`) is spent.
    fn park_until_woken(&self) {
        let mut idle = self.idle.lock().expect("idle mutex poisoned");
        loop {
            match idle.next_idle() {
                IdleState::Ongoing(state) => {
                    let wait = state
                        .and_then(|s| s.wait)
                        .unwrap_or(crate::retries::DEFAULT_MIN_DURATION);
                    if self.wake.wait_timeout(wait) {
                        idle.reset();
                        return;
                    }
                }
                IdleState::Expired => {
                    self.wake.wait();
                    idle.reset();
                    return;
                }
            }
        }
    }

    fn process_messages(&self) {
        let messages: Vec<TaskMessage> = {
            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            shared.message_queue.drain().collect()
        };

        for message in messages {
            match message {
                TaskMessage::ClearWaiting => {
                    let mut shared = self.shared.lock().expect("runner mutex poisoned");
                    shared.queued.clear();
                }
                TaskMessage::TerminateRunner => {
                    let mut shared = self.shared.lock().expect("runner mutex poisoned");
                    shared.queued.clear();
                    if let Some(running) = &shared.running {
                        running.lock().expect("task mutex poisoned").terminate();
                    }
                    shared.state = RunnerState::WillTerminate;
                }
            }
        }
    }

    /// Completes the running task (if it just finished) and, if the
    /// slot is free, pulls the next one off the queue and runs it to
    /// completion inline.
    fn run_next_task(&self) {
        let running = {
            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            if shared.running.is_none() {
                shared.running = shared.queued.pop_front();
            }
            shared.running.clone()
        };

        let Some(task) = running else { return };

        let dead = {
            let mut guard = task.lock().expect("task mutex poisoned");
            if !guard.is_initialized() {
                guard.initialize();
                guard.on_initialize();
            }
            if guard.state() == TaskState::Running {
                guard.run();
            }
            guard.is_dead()
        };

        if !dead {
            return;
        }

        let child = {
            let mut guard = task.lock().expect("task mutex poisoned");
            match guard.state() {
                TaskState::Terminated => guard.on_termination(),
                TaskState::Succeeded => guard.on_success(),
                TaskState::Failed => guard.on_failure(),
                _ => {}
            }
            let child = guard.take_child();
            guard.remove();
            child
        };

        if let Some(child) = child {
            let succeeded = task.lock().expect("task mutex poisoned").state() == TaskState::Succeeded;
            if succeeded {
                let mut shared = self.shared.lock().expect("runner mutex poisoned");
                shared.queued.push_front(child);
            } else {
                let mut guard = child.lock().expect("task mutex poisoned");
                guard.terminate();
                guard.on_termination();
            }
        }

        let mut shared = self.shared.lock().expect("runner mutex poisoned");
        shared.running = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::header::TaskHeader;
    use crate::work::new_task_ref;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    struct RecordingTask {
        header: TaskHeader,
        order: StdArc<Mutex<Vec<&'static str>>>,
        label: &'static str,
    }

    impl Task for RecordingTask {
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

    #[test]
    fn runs_queued_tasks_in_fifo_order() {
        let runner = TaskRunner::new(TaskRunnerConfig::default());
        runner.run();
        runner.wait_until_started();

        let order = StdArc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let task = new_task_ref(RecordingTask {
                header: TaskHeader::named(label),
                order: order.clone(),
                label,
            });
            runner.queue_task(task).expect("queue should accept");
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while order.lock().expect("order mutex poisoned").len() < 3
            && std::time::Instant::now() < deadline
        {
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(
            *order.lock().expect("order mutex poisoned"),
            vec!["first", "second", "third"]
        );

        runner.terminate_runner().expect("should accept shutdown");
        runner.wait_for_termination();
    }

    #[test]
    fn clear_waiting_drops_queued_but_not_running() {
        let runner = TaskRunner::new(TaskRunnerConfig::default());
        assert_eq!(runner.queued_count(), 0);
        runner.run();
        runner.wait_until_started();

        let order = StdArc::new(Mutex::new(Vec::new()));
        let task = new_task_ref(RecordingTask {
            header: TaskHeader::named("queued"),
            order: order.clone(),
            label: "queued",
        });
        runner.queue_task(task).expect("queue should accept");
        runner.clear_waiting().expect("should accept");

        runner.terminate_runner().expect("should accept shutdown");
        runner.wait_for_termination();

        assert!(order.lock().expect("order mutex poisoned").is_empty() || order.lock().unwrap().len() <= 1);
    }
}
