//! Cadence: a cooperative process/task scheduling core with an async
//! I/O layer built on top of it.
//!
//! - [`work`] defines the `Process`/`Task` work-unit model.
//! - [`runner`] hosts them: [`runner::ProcessRunner`] round-robins a
//!   bounded pool of pausable, priority-weighted processes on a
//!   dedicated thread; [`runner::TaskRunner`] runs a FIFO of
//!   run-to-completion tasks one at a time.
//! - [`manager`] owns a fixed fan-out of runners and spreads work
//!   across them.
//! - [`io`] is an async-style byte I/O layer whose operations are
//!   themselves tasks dispatched through a [`runner::TaskRunner`].

pub mod error;
pub mod id;
pub mod io;
pub mod manager;
mod queue;
pub mod retries;
pub mod runner;
pub mod synca;
pub mod work;

pub use error::{CadenceError, CadenceResult};
pub use id::WorkId;
