//! [`AsyncIOTask`]: the [`crate::work::Task`] that performs one async
//! I/O operation and signals its [`AsyncResult`] on completion.
//!
//! Grounded on `AsyncInputTask::run()`'s switch in
//! `original_source/src/core/io/asyncinputtask.cpp`: a single `run`
//! dispatches on the closed [`OperationKind`] set, then
//! `onCompletion()`/`taskCompleted()` publish the byte count to the
//! result. Because one Rust task type serves both directions, the
//! switch is keyed on `(target, kind)` instead of `kind` alone — the
//! target (`Input`/`Output`) already tells us which half of the twelve
//! kinds is reachable.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::id::WorkId;
use crate::io::op::OperationKind;
use crate::io::result::{AsyncBuffer, AsyncResult};
use crate::io::stream::{DataInputStream, DataOutputStream};
use crate::work::header::TaskHeader;
use crate::work::{new_task_ref, Task, TaskRef};

/// The stream an [`AsyncIOTask`] operates against. Which variant is
/// present determines direction: `Input` tasks read, `Output` tasks
/// write — the original expresses the same split as two parallel class
/// hierarchies (`AsyncInputTask` vs. its output-side counterpart).
pub enum AsyncTarget {
    Input(Arc<Mutex<dyn DataInputStream>>),
    Output(Arc<Mutex<dyn DataOutputStream>>),
}

static NEXT_TASK_SEQ: AtomicU32 = AtomicU32::new(1);

fn next_task_id() -> WorkId {
    WorkId::from_raw(NEXT_TASK_SEQ.fetch_add(1, Ordering::Relaxed))
}

pub struct AsyncIOTask {
    header: TaskHeader,
    target: AsyncTarget,
    kind: OperationKind,
    arg1: usize,
    arg2: usize,
    buffer: Option<AsyncBuffer>,
    result: Arc<AsyncResult>,
    bytes_transferred: usize,
}

impl AsyncIOTask {
    /// Builds a read task and its paired [`AsyncResult`], queues
    /// nothing itself — the caller hands the returned [`TaskRef`] to a
    /// [`crate::runner::TaskRunner`].
    pub fn new_read(
        kind: OperationKind,
        stream: Arc<Mutex<dyn DataInputStream>>,
        arg1: usize,
        arg2: usize,
        buffer: AsyncBuffer,
    ) -> (TaskRef, Arc<AsyncResult>) {
        Self::build(kind, AsyncTarget::Input(stream), arg1, arg2, buffer)
    }

    /// Builds a write task: `buffer` carries the values the caller
    /// wants persisted.
    pub fn new_write(
        kind: OperationKind,
        stream: Arc<Mutex<dyn DataOutputStream>>,
        arg1: usize,
        arg2: usize,
        buffer: AsyncBuffer,
    ) -> (TaskRef, Arc<AsyncResult>) {
        Self::build(kind, AsyncTarget::Output(stream), arg1, arg2, buffer)
    }

    fn build(
        kind: OperationKind,
        target: AsyncTarget,
        arg1: usize,
        arg2: usize,
        buffer: AsyncBuffer,
    ) -> (TaskRef, Arc<AsyncResult>) {
        let result = AsyncResult::new(AsyncBuffer::Bytes(Vec::new()));
        let task = new_task_ref(AsyncIOTask {
            header: TaskHeader::new(next_task_id(), None),
            target,
            kind,
            arg1,
            arg2,
            buffer: Some(buffer),
            result: result.clone(),
            bytes_transferred: 0,
        });
        result.set_task(&task);
        (task, result)
    }

    pub fn result(&self) -> Arc<AsyncResult> {
        self.result.clone()
    }

    fn perform(&mut self) -> io::Result<()> {
        let buffer = self.buffer.take().unwrap_or(AsyncBuffer::Bytes(Vec::new()));
        let (bytes, buffer) = match &self.target {
            AsyncTarget::Input(stream) => {
                let mut stream = stream.lock().expect("input stream mutex poisoned");
                read_operation(&mut *stream, self.kind, self.arg1, self.arg2, buffer)?
            }
            AsyncTarget::Output(stream) => {
                let mut stream = stream.lock().expect("output stream mutex poisoned");
                write_operation(&mut *stream, self.kind, buffer)?
            }
        };
        self.bytes_transferred = bytes;
        self.buffer = Some(buffer);
        Ok(())
    }
}

fn read_operation(
    stream: &mut dyn DataInputStream,
    kind: OperationKind,
    arg1: usize,
    arg2: usize,
    buffer: AsyncBuffer,
) -> io::Result<(usize, AsyncBuffer)> {
    match kind {
        OperationKind::Raw1 => {
            let mut bytes = vec![0u8; arg1];
            let n = stream.read(&mut bytes)?;
            Ok((n, AsyncBuffer::Bytes(bytes)))
        }
        OperationKind::Raw2 => {
            let mut bytes = vec![0u8; arg1 * arg2];
            let n = stream.read(&mut bytes)?;
            Ok((n, AsyncBuffer::Bytes(bytes)))
        }
        OperationKind::U32 => {
            let mut values = Vec::with_capacity(arg1);
            for _ in 0..arg1 {
                values.push(stream.read_u32()?);
            }
            let n = values.len();
            Ok((n * 4, AsyncBuffer::U32(values)))
        }
        OperationKind::U64 => {
            let mut values = Vec::with_capacity(arg1);
            for _ in 0..arg1 {
                values.push(stream.read_u64()?);
            }
            let n = values.len();
            Ok((n * 8, AsyncBuffer::U64(values)))
        }
        OperationKind::I32 => {
            let mut values = Vec::with_capacity(arg1);
            for _ in 0..arg1 {
                values.push(stream.read_i32()?);
            }
            let n = values.len();
            Ok((n * 4, AsyncBuffer::I32(values)))
        }
        OperationKind::I64 => {
            let mut values = Vec::with_capacity(arg1);
            for _ in 0..arg1 {
                values.push(stream.read_i64()?);
            }
            let n = values.len();
            Ok((n * 8, AsyncBuffer::I64(values)))
        }
        OperationKind::F32 => {
            let mut values = Vec::with_capacity(arg1);
            for _ in 0..arg1 {
                values.push(stream.read_f32()?);
            }
            let n = values.len();
            Ok((n * 4, AsyncBuffer::F32(values)))
        }
        OperationKind::F64 => {
            let mut values = Vec::with_capacity(arg1);
            for _ in 0..arg1 {
                values.push(stream.read_f64()?);
            }
            let n = values.len();
            Ok((n * 8, AsyncBuffer::F64(values)))
        }
        OperationKind::Bool => {
            let mut values = Vec::with_capacity(arg1);
            for _ in 0..arg1 {
                values.push(stream.read_bool()?);
            }
            let n = values.len();
            Ok((n, AsyncBuffer::Bool(values)))
        }
        OperationKind::Char => {
            let mut values = Vec::with_capacity(arg1);
            for _ in 0..arg1 {
                values.push(stream.read_char()?);
            }
            let n = values.len();
            Ok((n, AsyncBuffer::Char(values)))
        }
        OperationKind::CString => {
            let value = stream.read_cstr()?;
            let len = value.len();
            Ok((4 + len, AsyncBuffer::CString(value)))
        }
        OperationKind::Object => match buffer {
            AsyncBuffer::Object(object) => {
                let n = object
                    .lock()
                    .expect("serializable mutex poisoned")
                    .read_from(stream)?;
                Ok((n, AsyncBuffer::Object(object)))
            }
            other => Ok((0, other)),
        },
    }
}

fn write_operation(
    stream: &mut dyn DataOutputStream,
    kind: OperationKind,
    buffer: AsyncBuffer,
) -> io::Result<(usize, AsyncBuffer)> {
    match (kind, buffer) {
        (OperationKind::Raw1 | OperationKind::Raw2, AsyncBuffer::Bytes(bytes)) => {
            let n = stream.write(&bytes)?;
            Ok((n, AsyncBuffer::Bytes(bytes)))
        }
        (OperationKind::U32, AsyncBuffer::U32(values)) => {
            let mut n = 0;
            for value in &values {
                n += stream.write_u32(*value)?;
            }
            Ok((n, AsyncBuffer::U32(values)))
        }
        (OperationKind::U64, AsyncBuffer::U64(values)) => {
            let mut n = 0;
            for value in &values {
                n += stream.write_u64(*value)?;
            }
            Ok((n, AsyncBuffer::U64(values)))
        }
        (OperationKind::I32, AsyncBuffer::I32(values)) => {
            let mut n = 0;
            for value in &values {
                n += stream.write_i32(*value)?;
            }
            Ok((n, AsyncBuffer::I32(values)))
        }
        (OperationKind::I64, AsyncBuffer::I64(values)) => {
            let mut n = 0;
            for value in &values {
                n += stream.write_i64(*value)?;
            }
            Ok((n, AsyncBuffer::I64(values)))
        }
        (OperationKind::F32, AsyncBuffer::F32(values)) => {
            let mut n = 0;
            for value in &values {
                n += stream.write_f32(*value)?;
            }
            Ok((n, AsyncBuffer::F32(values)))
        }
        (OperationKind::F64, AsyncBuffer::F64(values)) => {
            let mut n = 0;
            for value in &values {
                n += stream.write_f64(*value)?;
            }
            Ok((n, AsyncBuffer::F64(values)))
        }
        (OperationKind::Bool, AsyncBuffer::Bool(values)) => {
            let mut n = 0;
            for value in &values {
                n += stream.write_bool(*value)?;
            }
            Ok((n, AsyncBuffer::Bool(values)))
        }
        (OperationKind::Char, AsyncBuffer::Char(values)) => {
            let mut n = 0;
            for value in &values {
                n += stream.write_char(*value)?;
            }
            Ok((n, AsyncBuffer::Char(values)))
        }
        (OperationKind::CString, AsyncBuffer::CString(value)) => {
            let n = stream.write_cstr(&value)?;
            Ok((n, AsyncBuffer::CString(value)))
        }
        (OperationKind::Object, AsyncBuffer::Object(object)) => {
            let n = object
                .lock()
                .expect("serializable mutex poisoned")
                .write_to(stream)?;
            Ok((n, AsyncBuffer::Object(object)))
        }
        (_, other) => Ok((0, other)),
    }
}

impl Task for AsyncIOTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }

    fn run(&mut self) {
        match self.perform() {
            Ok(()) => self.succeed(),
            Err(_) => self.fail(),
        }
    }

    /// Publishes the byte count and final buffer to the result and
    /// clears the result's back-pointer, matching
    /// `AsyncInputTask::onCompletion` calling `taskCompleted`.
    fn on_success(&mut self) {
        let buffer = self.buffer.take().unwrap_or(AsyncBuffer::Bytes(Vec::new()));
        self.result.task_completed(self.bytes_transferred, buffer);
    }

    fn on_failure(&mut self) {
        let buffer = self.buffer.take().unwrap_or(AsyncBuffer::Bytes(Vec::new()));
        self.result.task_completed(0, buffer);
    }

    fn on_termination(&mut self) {
        let buffer = self.buffer.take().unwrap_or(AsyncBuffer::Bytes(Vec::new()));
        self.result.task_completed(0, buffer);
    }
}
