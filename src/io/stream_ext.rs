//! [`AsyncStream`]: ergonomic `async_read_*`/`async_write_*` entry
//! points over a [`DataInputStream`]/[`DataOutputStream`], each of which
//! constructs an [`AsyncIOTask`] and hands it to the
//! [`IOManager`]'s [`crate::runner::TaskRunner`].
//!
//! Grounded on `AsyncInputStream`/`AsyncDataInputStream` in
//! `original_source/include/core/io/asyncinputstream.h` and
//! `asyncdatainputstream.h`: each `read*`/`write*` method there builds
//! an `AsyncInputTask` of the matching `AsyncInputType` and hands it to
//! `IOManager::getInstance()->getTaskRunner()->run(task)`.

use std::sync::{Arc, Mutex};

use crate::error::CadenceResult;
use crate::io::manager::IOManager;
use crate::io::op::OperationKind;
use crate::io::result::{AsyncBuffer, AsyncResult};
use crate::io::stream::{DataInputStream, DataOutputStream, Serializable};
use crate::io::task::AsyncIOTask;

/// Wraps a [`DataInputStream`] to expose asynchronous reads. Mirrors
/// `AsyncDataInputStream` wrapping a `DataInputStream`.
pub struct AsyncInputStream {
    stream: Arc<Mutex<dyn DataInputStream>>,
}

impl AsyncInputStream {
    pub fn new(stream: Arc<Mutex<dyn DataInputStream>>) -> Self {
        Self { stream }
    }

    fn dispatch(&self, kind: OperationKind, arg1: usize, arg2: usize) -> CadenceResult<Arc<AsyncResult>> {
        let (task, result) =
            AsyncIOTask::new_read(kind, self.stream.clone(), arg1, arg2, AsyncBuffer::Bytes(Vec::new()));
        IOManager::get_instance()?.queue_task(task)?;
        Ok(result)
    }

    /// `read(buffer, total_bytes)` — `ASYNC_READ_1`.
    pub fn async_read(&self, total_bytes: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::Raw1, total_bytes, 0)
    }

    /// `read(buffer, count, size)` — `ASYNC_READ_2`.
    pub fn async_read_counted(&self, count: usize, size: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::Raw2, count, size)
    }

    pub fn async_read_u32(&self, count: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::U32, count, 0)
    }

    pub fn async_read_u64(&self, count: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::U64, count, 0)
    }

    pub fn async_read_i32(&self, count: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::I32, count, 0)
    }

    pub fn async_read_i64(&self, count: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::I64, count, 0)
    }

    pub fn async_read_f32(&self, count: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::F32, count, 0)
    }

    pub fn async_read_f64(&self, count: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::F64, count, 0)
    }

    pub fn async_read_bool(&self, count: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::Bool, count, 0)
    }

    pub fn async_read_char(&self, count: usize) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::Char, count, 0)
    }

    pub fn async_read_cstr(&self) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::CString, 0, 0)
    }

    /// Reads a [`Serializable`] object, delegating to its own
    /// `read_from` under the async task — matches `ASYNC_READ_OBJECT`
    /// calling `ObjectInputStream::readObject`.
    pub fn async_read_object(
        &self,
        object: Arc<Mutex<dyn Serializable + Send>>,
    ) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch_object(object)
    }

    fn dispatch_object(&self, object: Arc<Mutex<dyn Serializable + Send>>) -> CadenceResult<Arc<AsyncResult>> {
        let (task, result) = AsyncIOTask::new_read(
            OperationKind::Object,
            self.stream.clone(),
            0,
            0,
            AsyncBuffer::Object(object),
        );
        IOManager::get_instance()?.queue_task(task)?;
        Ok(result)
    }
}

/// Wraps a [`DataOutputStream`] to expose asynchronous writes.
pub struct AsyncOutputStream {
    stream: Arc<Mutex<dyn DataOutputStream>>,
}

impl AsyncOutputStream {
    pub fn new(stream: Arc<Mutex<dyn DataOutputStream>>) -> Self {
        Self { stream }
    }

    fn dispatch(&self, kind: OperationKind, buffer: AsyncBuffer) -> CadenceResult<Arc<AsyncResult>> {
        let (task, result) = AsyncIOTask::new_write(kind, self.stream.clone(), 0, 0, buffer);
        IOManager::get_instance()?.queue_task(task)?;
        Ok(result)
    }

    pub fn async_write(&self, bytes: Vec<u8>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::Raw1, AsyncBuffer::Bytes(bytes))
    }

    pub fn async_write_u32(&self, values: Vec<u32>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::U32, AsyncBuffer::U32(values))
    }

    pub fn async_write_u64(&self, values: Vec<u64>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::U64, AsyncBuffer::U64(values))
    }

    pub fn async_write_i32(&self, values: Vec<i32>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::I32, AsyncBuffer::I32(values))
    }

    pub fn async_write_i64(&self, values: Vec<i64>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::I64, AsyncBuffer::I64(values))
    }

    pub fn async_write_f32(&self, values: Vec<f32>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::F32, AsyncBuffer::F32(values))
    }

    pub fn async_write_f64(&self, values: Vec<f64>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::F64, AsyncBuffer::F64(values))
    }

    pub fn async_write_bool(&self, values: Vec<bool>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::Bool, AsyncBuffer::Bool(values))
    }

    pub fn async_write_char(&self, values: Vec<u8>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::Char, AsyncBuffer::Char(values))
    }

    pub fn async_write_cstr(&self, value: String) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::CString, AsyncBuffer::CString(value))
    }

    pub fn async_write_object(&self, object: Arc<Mutex<dyn Serializable + Send>>) -> CadenceResult<Arc<AsyncResult>> {
        self.dispatch(OperationKind::Object, AsyncBuffer::Object(object))
    }
}
