//! Crate-wide error type.
//!
//! Most fallible operations in this crate return `bool`/`Option` rather
//! than `Result` — that mirrors the original's own error taxonomy
//! (queue-full and unknown-id are sentinels a caller is expected to
//! check, not exceptions). `CadenceError` is reserved for the handful of
//! entry points where a typed error carries more than a sentinel can,
//! namely manager runner creation and singleton misuse.

use crate::runner::RunnerState;

#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    #[error("input or message queue is full")]
    QueueFull,

    #[error("runner is not in a usable state: {0:?}")]
    RunnerNotUsable(RunnerState),

    #[error("no runner registered under this id")]
    UnknownRunner,

    #[error("a runner with this id already exists")]
    DuplicateRunner,

    #[error("manager is at capacity for runners")]
    ManagerFull,

    #[error("the IOManager singleton has not been initialized")]
    IoManagerNotInitialized,

    #[error("stream is already open in mode {0:?}")]
    StreamAlreadyOpen(String),

    #[error("stream i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CadenceResult<T> = Result<T, CadenceError>;
