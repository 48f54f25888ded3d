//! Time-sliced, round-robin scheduler for long-lived, pausable,
//! priority-weighted [`Process`] work units.
//!
//! Grounded on
//! `original_source/src/core/threading/processrunner.cpp`: a fixed-size
//! slot arena (free/running/paused/removed) reclaimed with a one-sweep
//! deferral, a bounded input queue for admission and a bounded message
//! queue for control operations, both guarded by a single `sync_lock`
//! (`Mutex` + `Condvar`) that also gates the runner's own lifecycle
//! state.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{CadenceError, CadenceResult};
use crate::id::WorkId;
use crate::queue::BoundedQueue;
use crate::retries::ExponentialBackoffDecider;
use crate::runner::RunnerState;
use crate::synca::{AbortIfPanic, Entry, EntryList, IdleState, Idleman, LockSignal};
use crate::work::{ProcessRef, ProcessState};

/// Idle sweeps before the runner gives up backing off and parks on
/// [`LockSignal::wait`] indefinitely.
const MAX_IDLE_BACKOFFS: u32 = 8;
const MAX_IDLE_WAIT: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug)]
pub struct ProcessRunnerConfig {
    /// Maximum number of processes the runner can host at once (the sum
    /// of its free/running/paused/removed pools).
    pub capacity: usize,
    /// Depth of the admission queue (new processes awaiting a slot).
    pub input_queue_size: usize,
    /// Depth of the control-message queue (pause/resume/terminate).
    pub message_queue_size: usize,
    /// Base time budget handed to [`crate::work::Process::requested_run_time`]
    /// each sweep; the per-process value actually passed to `run` is
    /// this multiplied by the process's priority and priority modifier.
    pub tick_budget: u32,
}

impl Default for ProcessRunnerConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            input_queue_size: 64,
            message_queue_size: 96,
            tick_budget: 1,
        }
    }
}

enum ProcessMessage {
    Pause(WorkId),
    Resume(WorkId),
    Terminate(WorkId),
    TerminateAll,
    TerminateRunner,
}

struct Slot {
    process: ProcessRef,
    removal_count: i32,
}

struct Shared {
    slots: EntryList<Slot>,
    running: VecDeque<Entry>,
    paused: Vec<Entry>,
    removed: Vec<Entry>,
    index: HashMap<WorkId, Entry>,
    input_queue: BoundedQueue<ProcessRef>,
    message_queue: BoundedQueue<ProcessMessage>,
    state: RunnerState,
}

impl Shared {
    fn occupied(&self) -> usize {
        self.running.len() + self.paused.len() + self.removed.len()
    }

    fn has_running(&self) -> bool {
        !self.running.is_empty()
    }

    /// Nothing for a sweep to do: no process running, nothing freshly
    /// queued or waiting on a control message, and no slot still
    /// sitting in deferred removal waiting for the next sweep's reclaim.
    fn is_idle(&self) -> bool {
        !self.has_running()
            && self.input_queue.is_empty()
            && self.message_queue.is_empty()
            && self.removed.is_empty()
    }
}

/// A single background thread hosting up to `capacity` processes,
/// ticking the running ones in round robin and servicing pause/resume/
/// terminate requests between sweeps.
pub struct ProcessRunner {
    config: ProcessRunnerConfig,
    shared: Mutex<Shared>,
    condvar: Condvar,
    wake: LockSignal,
    idle: Mutex<Idleman>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessRunner {
    pub fn new(config: ProcessRunnerConfig) -> Arc<Self> {
        Arc::new(Self {
            shared: Mutex::new(Shared {
                slots: EntryList::new(),
                running: VecDeque::new(),
                paused: Vec::new(),
                removed: Vec::new(),
                index: HashMap::new(),
                input_queue: BoundedQueue::with_capacity(config.input_queue_size),
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
            config,
        })
    }

    /// Spawns the runner's background thread. A no-op if already
    /// started (checked by runner state, not thread presence).
    pub fn run(self: &Arc<Self>) {
        {
            let shared = self.shared.lock().expect("runner mutex poisoned");
            if shared.state != RunnerState::NotStarted {
                return;
            }
        }

        let this = Arc::clone(self);
        let join = thread::Builder::new()
            .name("cadence-process-runner".into())
            .spawn(move || this.processing_loop())
            .expect("failed to spawn process runner thread");

        *self.handle.lock().expect("runner mutex poisoned") = Some(join);
    }

    pub fn state(&self) -> RunnerState {
        self.shared.lock().expect("runner mutex poisoned").state
    }

    pub fn process_count(&self) -> usize {
        let shared = self.shared.lock().expect("runner mutex poisoned");
        shared.occupied()
    }

    pub fn running_count(&self) -> usize {
        self.shared.lock().expect("runner mutex poisoned").running.len()
    }

    pub fn paused_count(&self) -> usize {
        self.shared.lock().expect("runner mutex poisoned").paused.len()
    }

    pub fn free_count(&self) -> usize {
        let shared = self.shared.lock().expect("runner mutex poisoned");
        self.config.capacity.saturating_sub(shared.occupied())
    }

    pub fn get_process(&self, id: WorkId) -> Option<ProcessRef> {
        let shared = self.shared.lock().expect("runner mutex poisoned");
        let entry = shared.index.get(&id)?;
        shared.slots.get(entry).map(|slot| slot.process.clone())
    }

    pub fn queue_process(&self, process: ProcessRef) -> CadenceResult<()> {
        let mut shared = self.shared.lock().expect("runner mutex poisoned");
        if !shared.state.is_usable() {
            return Err(CadenceError::RunnerNotUsable(shared.state));
        }
        shared
            .input_queue
            .push(process)
            .map_err(|_| CadenceError::QueueFull)?;
        drop(shared);
        self.condvar.notify_all();
        self.wake.signal_all();
        Ok(())
    }

    pub fn pause_process(&self, id: WorkId) -> CadenceResult<()> {
        self.post_message(ProcessMessage::Pause(id))
    }

    pub fn resume_process(&self, id: WorkId) -> CadenceResult<()> {
        self.post_message(ProcessMessage::Resume(id))
    }

    pub fn terminate_process(&self, id: WorkId) -> CadenceResult<()> {
        self.post_message(ProcessMessage::Terminate(id))
    }

    pub fn terminate_all(&self) -> CadenceResult<()> {
        self.post_message(ProcessMessage::TerminateAll)
    }

    /// Requests the runner wind down: stop accepting new work, terminate
    /// everything in flight, and exit the background thread once the
    /// last removed slot has been reclaimed.
    pub fn terminate_runner(&self) -> CadenceResult<()> {
        self.post_message(ProcessMessage::TerminateRunner)
    }

    fn post_message(&self, message: ProcessMessage) -> CadenceResult<()> {
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
        debug!("process runner started");

        loop {
            {
                let shared = self.shared.lock().expect("runner mutex poisoned");
                if shared.state == RunnerState::Running && shared.is_idle() {
                    // Arm the wake signal while still holding `shared` so a
                    // producer (who must also take this lock to push work)
                    // can never signal in the gap between this check and
                    // the park below.
                    self.wake.try_lock();
                    drop(shared);
                    self.park_until_woken();
                    continue;
                }

                let drained = shared.removed.is_empty() && !shared.has_running();
                if shared.state != RunnerState::Running && drained {
                    break;
                }
            }

            self.run_processes(self.config.tick_budget);
        }

        {
            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            shared.state = RunnerState::Terminated;
        }
        self.condvar.notify_all();
        debug!("process runner terminated");
    }

    /// Backs off in bounded, jittered steps while nothing is runnable,
    /// then parks indefinitely on [`LockSignal::wait`] once the backoff
    /// budget (`idle`) is spent. Any producer's [`LockSignal::signal_all`]
    /// wakes it immediately from either phase.
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

    /// One full sweep: reclaim slots removed last sweep, admit new
    /// work, drain control messages, then tick every running process.
    fn run_processes(&self, budget: u32) {
        {
            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            self.reclaim_removed(&mut shared);
        }
        {
            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            self.admit_from_input_queue(&mut shared);
        }
        {
            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            if !shared.message_queue.is_empty() {
                self.process_messages(&mut shared);
            }
        }

        self.tick_running(budget);
    }

    fn reclaim_removed(&self, shared: &mut Shared) {
        let entries = std::mem::take(&mut shared.removed);
        let mut still_waiting = Vec::with_capacity(entries.len());

        for entry in entries {
            let ready = match shared.slots.get_mut(&entry) {
                Some(slot) => {
                    slot.removal_count -= 1;
                    slot.removal_count <= 0
                }
                None => true,
            };

            if !ready {
                still_waiting.push(entry);
                continue;
            }

            self.check_for_parent_and_detach(shared, &entry);
            shared.slots.vacate(&entry);
        }

        shared.removed = still_waiting;
    }

    /// If the process about to be reclaimed is still referenced as
    /// somebody's child, clear that back-link so the parent doesn't
    /// hold a dangling reference.
    fn check_for_parent_and_detach(&self, shared: &Shared, entry: &Entry) {
        let Some(slot) = shared.slots.get(entry) else {
            return;
        };
        let removed_id = {
            let process = slot.process.lock().expect("process mutex poisoned");
            process.id()
        };
        let Some(parent_id) = ({
            let process = slot.process.lock().expect("process mutex poisoned");
            process.parent_id()
        }) else {
            return;
        };
        let Some(parent_entry) = shared.index.get(&parent_id) else {
            return;
        };
        let Some(parent_slot) = shared.slots.get(parent_entry) else {
            return;
        };
        let mut parent = parent_slot.process.lock().expect("process mutex poisoned");
        if parent.child().map(|c| c.lock().expect("process mutex poisoned").id()) == Some(removed_id) {
            let _ = parent.take_child();
        }
    }

    fn admit_from_input_queue(&self, shared: &mut Shared) {
        while shared.occupied() < self.config.capacity {
            let Some(process) = shared.input_queue.pop() else {
                break;
            };
            self.admit(shared, process);
        }
    }

    fn admit(&self, shared: &mut Shared, process: ProcessRef) {
        let id = process.lock().expect("process mutex poisoned").id();
        if shared.index.contains_key(&id) {
            warn!(?id, "dropping process with duplicate id");
            return;
        }
        let entry = shared.slots.insert(Slot {
            process,
            removal_count: 0,
        });
        shared.running.push_back(entry.clone());
        shared.index.insert(id, entry);
    }

    fn process_messages(&self, shared: &mut Shared) {
        let messages: Vec<ProcessMessage> = shared.message_queue.drain().collect();
        for message in messages {
            match message {
                ProcessMessage::Pause(id) => self.handle_pause(shared, id),
                ProcessMessage::Resume(id) => self.handle_resume(shared, id),
                ProcessMessage::Terminate(id) => self.handle_terminate(shared, id),
                ProcessMessage::TerminateAll => self.handle_terminate_all(shared),
                ProcessMessage::TerminateRunner => {
                    self.handle_terminate_all(shared);
                    shared.state = RunnerState::WillTerminate;
                }
            }
        }
    }

    fn handle_pause(&self, shared: &mut Shared, id: WorkId) {
        let Some(entry) = shared.index.get(&id).cloned() else {
            return;
        };
        if let Some(pos) = shared.running.iter().position(|e| *e == entry) {
            shared.running.remove(pos);
            shared.paused.push(entry.clone());
        }
        if let Some(slot) = shared.slots.get(&entry) {
            slot.process.lock().expect("process mutex poisoned").pause();
        }
    }

    fn handle_resume(&self, shared: &mut Shared, id: WorkId) {
        let Some(entry) = shared.index.get(&id).cloned() else {
            return;
        };
        if let Some(pos) = shared.paused.iter().position(|e| *e == entry) {
            shared.paused.remove(pos);
            shared.running.push_back(entry.clone());
        }
        if let Some(slot) = shared.slots.get(&entry) {
            slot.process.lock().expect("process mutex poisoned").resume();
        }
    }

    /// Terminating a paused process first puts it back on the running
    /// list so the tick pass (not the message pass) fires
    /// `on_termination` and performs slot reclamation, same as every
    /// other death.
    fn handle_terminate(&self, shared: &mut Shared, id: WorkId) {
        let Some(entry) = shared.index.get(&id).cloned() else {
            return;
        };
        if let Some(pos) = shared.paused.iter().position(|e| *e == entry) {
            shared.paused.remove(pos);
            shared.running.push_back(entry.clone());
        }
        if let Some(slot) = shared.slots.get(&entry) {
            slot.process.lock().expect("process mutex poisoned").terminate();
        }
    }

    fn handle_terminate_all(&self, shared: &mut Shared) {
        shared.input_queue = BoundedQueue::with_capacity(self.config.input_queue_size);

        for entry in shared.running.iter() {
            if let Some(slot) = shared.slots.get(entry) {
                slot.process.lock().expect("process mutex poisoned").terminate();
            }
        }

        let paused = std::mem::take(&mut shared.paused);
        for entry in paused {
            if let Some(slot) = shared.slots.get(&entry) {
                slot.process.lock().expect("process mutex poisoned").terminate();
            }
            shared.running.push_back(entry);
        }
    }

    fn tick_running(&self, budget: u32) {
        let entries: Vec<Entry> = {
            let shared = self.shared.lock().expect("runner mutex poisoned");
            shared.running.iter().cloned().collect()
        };

        for entry in entries {
            let process = {
                let shared = self.shared.lock().expect("runner mutex poisoned");
                shared.slots.get(&entry).map(|slot| slot.process.clone())
            };
            let Some(process) = process else { continue };

            let dead = {
                let mut guard = process.lock().expect("process mutex poisoned");
                if !guard.is_initialized() {
                    guard.initialize();
                    guard.on_initialize();
                }
                if guard.state() == ProcessState::Running {
                    let weight = guard.requested_run_time(budget);
                    guard.run(weight);
                }
                guard.is_dead()
            };

            if !dead {
                continue;
            }

            self.dispatch_death(&entry, &process);

            let mut shared = self.shared.lock().expect("runner mutex poisoned");
            if let Some(pos) = shared.running.iter().position(|e| *e == entry) {
                shared.running.remove(pos);
            }
            shared.index.retain(|_, e| *e != entry);
            if let Some(slot) = shared.slots.get_mut(&entry) {
                slot.removal_count = 1;
            }
            shared.removed.push(entry);
        }
    }

    fn dispatch_death(&self, entry: &Entry, process: &ProcessRef) {
        let (state, child) = {
            let mut guard = process.lock().expect("process mutex poisoned");
            let state = guard.state();
            match state {
                ProcessState::Terminated => guard.on_termination(),
                ProcessState::Succeeded => guard.on_success(),
                ProcessState::Failed => guard.on_failure(),
                _ => {}
            }
            // Succession (on success) or cancellation (on termination/
            // failure) both hand the child off to this scope; either
            // way the dying process shouldn't keep a dangling link.
            (state, guard.take_child())
        };

        if state == ProcessState::Succeeded {
            if let Some(child) = child {
                let mut shared = self.shared.lock().expect("runner mutex poisoned");
                if shared.occupied() < self.config.capacity {
                    self.admit(&mut shared, child);
                } else if shared.input_queue.push(child).is_err() {
                    warn!("succession child dropped: runner at capacity and input queue full");
                }
            }
        } else if let Some(child) = child {
            // Parent died abnormally: the child never gets to run.
            let mut guard = child.lock().expect("process mutex poisoned");
            guard.terminate();
            guard.on_termination();
        }

        let _ = entry;
        let mut guard = process.lock().expect("process mutex poisoned");
        guard.mark_for_removal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::header::ProcessHeader;
    use crate::work::{new_process_ref, Process};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProcess {
        header: ProcessHeader,
        ticks: Arc<AtomicUsize>,
        ticks_to_live: usize,
    }

    impl Process for CountingProcess {
        fn header(&self) -> &ProcessHeader {
            &self.header
        }
        fn header_mut(&mut self) -> &mut ProcessHeader {
            &mut self.header
        }
        fn run(&mut self, _budget: u32) {
            let seen = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if seen >= self.ticks_to_live {
                self.succeed();
            }
        }
    }

    #[test]
    fn runs_a_process_to_completion() {
        let runner = ProcessRunner::new(ProcessRunnerConfig::default());
        runner.run();
        runner.wait_until_started();

        let ticks = Arc::new(AtomicUsize::new(0));
        let process = new_process_ref(CountingProcess {
            header: ProcessHeader::named("counter"),
            ticks: ticks.clone(),
            ticks_to_live: 3,
        });

        runner.queue_process(process).expect("queue should accept");

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while ticks.load(Ordering::SeqCst) < 3 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        runner.terminate_runner().expect("should accept shutdown");
        runner.wait_for_termination();
    }

    #[test]
    fn rejects_admission_once_terminating() {
        let runner = ProcessRunner::new(ProcessRunnerConfig::default());
        runner.run();
        runner.wait_until_started();
        runner.terminate_runner().expect("should accept shutdown");
        runner.wait_for_termination();

        let ticks = Arc::new(AtomicUsize::new(0));
        let process = new_process_ref(CountingProcess {
            header: ProcessHeader::named("late"),
            ticks,
            ticks_to_live: 1,
        });
        assert!(matches!(
            runner.queue_process(process),
            Err(CadenceError::RunnerNotUsable(RunnerState::Terminated))
        ));
    }
}
