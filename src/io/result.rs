//! [`AsyncResult`]: a ref-counted, condvar-signalled completion handle.
//!
//! Grounded on `AsyncReadResult`/`AsyncResult` in
//! `original_source/include/core/io/asyncinputtask.h` and
//! `src/core/io/asyncinputtask.cpp`'s `taskCompleted`: a lock + condvar
//! pair guarding a completion flag and a byte count, with the buffer the
//! operation filled (or read from) reachable through the same handle.

use std::sync::{Arc, Condvar, Mutex, Weak};

use crate::io::stream::Serializable;
use crate::work::TaskRef;

/// The buffer an [`crate::io::task::AsyncIOTask`] reads into or writes
/// from. Stands in for the original's untyped `VPtr buffer_` — Rust
/// gives us the chance to keep it typed per operation kind instead of
/// reinterpret-casting a void pointer.
pub enum AsyncBuffer {
    Bytes(Vec<u8>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Char(Vec<u8>),
    CString(String),
    Object(Arc<Mutex<dyn Serializable + Send>>),
}

struct State {
    complete: bool,
    bytes_transferred: usize,
    buffer: AsyncBuffer,
    /// Back-pointer to the task this result belongs to. Cleared by
    /// [`AsyncResult::task_completed`] the same way the original
    /// clears it in `onCompletion`/the `AsyncReadResult` destructor, so
    /// nothing here ever reaches through a freed task (moot for
    /// soundness under `Arc`, but kept to mirror the observable
    /// "task reference is null after completion" behavior the
    /// original's callers depend on).
    task: Option<Weak<Mutex<dyn crate::work::Task>>>,
}

/// A ref-counted handle a caller waits on for an async I/O operation to
/// complete. One `AsyncResult` is created per [`crate::io::task::AsyncIOTask`]
/// and shared between the task (which signals it) and the caller (which
/// waits on it) via `Arc`.
pub struct AsyncResult {
    state: Mutex<State>,
    condvar: Condvar,
}

impl AsyncResult {
    pub(crate) fn new(buffer: AsyncBuffer) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                complete: false,
                bytes_transferred: 0,
                buffer,
                task: None,
            }),
            condvar: Condvar::new(),
        })
    }

    pub(crate) fn set_task(&self, task: &TaskRef) {
        let mut state = self.state.lock().expect("async result mutex poisoned");
        state.task = Some(Arc::downgrade(task));
    }

    /// Blocks the calling thread until the task completes (successfully,
    /// by failure, or by termination), returning `true` once signalled.
    /// Mirrors `AsyncResult::waitForResult`'s lock-wait-unlock cycle.
    pub fn wait_for_result(&self) -> bool {
        let state = self.state.lock().expect("async result mutex poisoned");
        let _unused = self
            .condvar
            .wait_while(state, |s| !s.complete)
            .expect("async result mutex poisoned");
        true
    }

    pub fn is_complete(&self) -> bool {
        self.state.lock().expect("async result mutex poisoned").complete
    }

    pub fn bytes_transferred(&self) -> usize {
        self.state
            .lock()
            .expect("async result mutex poisoned")
            .bytes_transferred
    }

    /// `true` once the owning task has signalled completion and cleared
    /// its own back-reference, matching scenario 5's "task reference on
    /// the result is null after completion."
    pub fn task_is_cleared(&self) -> bool {
        self.state
            .lock()
            .expect("async result mutex poisoned")
            .task
            .is_none()
    }

    /// Runs `f` against the result buffer under its lock; used by tests
    /// and callers that need to inspect what the operation produced.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&AsyncBuffer) -> R) -> R {
        let state = self.state.lock().expect("async result mutex poisoned");
        f(&state.buffer)
    }

    /// Called by the owning task under its own lock once `run` returns:
    /// records the transferred byte count, clears the back-pointer to
    /// the task, flips the completion flag, and wakes every waiter.
    /// Mirrors `AsyncReadResult::taskCompleted`.
    pub(crate) fn task_completed(&self, bytes_transferred: usize, buffer: AsyncBuffer) {
        let mut state = self.state.lock().expect("async result mutex poisoned");
        state.bytes_transferred = bytes_transferred;
        state.buffer = buffer;
        state.task = None;
        state.complete = true;
        self.condvar.notify_all();
    }
}
