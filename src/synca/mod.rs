//! Small primitives shared by the process and task runners: a
//! generation-tagged slot arena (`EntryList`) used for the free/running/
//! paused/removed pools, a `Condvar`+`Mutex` wake signal (`LockSignal`),
//! a bounded idle-backoff policy built on it (`Idleman`), and a couple
//! of drop guards.

mod drops;
mod entrylist;
mod idleman;
mod lock;

pub use drops::*;
pub use entrylist::*;
pub use idleman::*;
pub use lock::*;
