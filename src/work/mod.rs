//! The `Process`/`Task` work-unit model: lifecycle state machines,
//! parent/child composition, and the shared header fields backing both.

pub mod header;
mod process;
mod task;

pub use header::{ProcessRef, TaskRef};
pub use process::{new_process_ref, Process, ProcessState};
pub use task::{new_task_ref, Task, TaskState};
