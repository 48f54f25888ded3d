//! Fixed-capacity, name-indexed fleets of runners: [`ProcessManager`]
//! owns a set of named [`crate::runner::ProcessRunner`]s, [`TaskManager`]
//! owns a set of named [`crate::runner::TaskRunner`]s. Work is queued
//! directly to a runner by name; `TaskManager` additionally offers an
//! unnamed `queue_task_any` that round-robins across the fleet. Control
//! calls either target one named runner or, given only a work unit's
//! id, scan every runner in the fleet to find it.

mod process_manager;
mod task_manager;

pub use process_manager::ProcessManager;
pub use task_manager::TaskManager;
