//! The closed set of operation kinds an [`crate::io::task::AsyncIOTask`]
//! may dispatch, grounded on `AsyncInputType` in
//! `original_source/include/core/io/asyncinputtask.h`. Per §6.3 the set
//! is fixed at exactly twelve kinds. Direction (read vs. write) is a
//! separate axis, carried by which [`crate::io::task::AsyncTarget`]
//! variant a task was built with rather than folded into this enum —
//! the original expresses the same split as two parallel class
//! hierarchies (`AsyncDataInputStream`/`AsyncDataOutputStream`) over one
//! operation vocabulary.

/// One of the twelve dispatchable operation kinds. A `match` on this
/// tag, together with the task's target direction, selects the typed
/// read/write to invoke on the wrapped stream — no open dispatch, per
/// §9.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    /// Untyped transfer of a flat byte count: `stream.read(buffer,
    /// total_bytes)` on the read side (`ASYNC_READ_1`), `stream.write`
    /// of the same buffer on the write side.
    Raw1,
    /// Untyped transfer of `count` elements of `size` bytes each:
    /// `stream.read(buffer, count, size)` on the read side
    /// (`ASYNC_READ_2`).
    Raw2,
    U32,
    U64,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Char,
    CString,
    Object,
}
