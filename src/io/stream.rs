//! Byte-stream traits and a file-backed descriptor.
//!
//! Grounded on `original_source/include/core/io/inputstream.h`,
//! `datainputstream.h`, `streamdescriptor.h` and `filedescriptor.h`: the
//! method surface below is a direct translation of those interfaces
//! into Rust traits, `Send` so a stream can be handed to a
//! [`crate::runner::TaskRunner`] thread.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{CadenceError, CadenceResult};

/// Readable byte source. Mirrors `InputStream`: `is_positionable`
/// defaults to `false` and `rewind` to a no-op, since most streams
/// (sockets, pipes) can't seek backwards.
pub trait InputStream: Send {
    fn can_read(&self) -> bool;
    fn close(&mut self);
    fn is_positionable(&self) -> bool {
        false
    }
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;
    fn rewind(&mut self, _bytes: usize) -> io::Result<usize> {
        Ok(0)
    }
    fn skip(&mut self, bytes: usize) -> io::Result<usize> {
        let mut discard = vec![0u8; bytes];
        self.read(&mut discard)
    }
}

/// Writable byte sink. Mirrors the (implicit, symmetric) `OutputStream`
/// counterpart to `InputStream` in the original.
pub trait OutputStream: Send {
    fn can_write(&self) -> bool;
    fn close(&mut self);
    fn flush(&mut self) -> io::Result<()>;
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize>;
}

/// Fixed-width reads layered on top of [`InputStream`]. Every method
/// defaults to filling a correctly sized buffer via `read` and decoding
/// little-endian, matching `DataInputStream`'s `readU32`/`readF64`/...
/// family, each of which delegates to `read(buffer, count, sizeof(T))`
/// in the original.
pub trait DataInputStream: InputStream {
    fn read_bool(&mut self) -> io::Result<bool> {
        let mut buf = [0u8; 1];
        self.read(&mut buf)?;
        Ok(buf[0] != 0)
    }

    fn read_char(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read(&mut buf)?;
        Ok(buf[0])
    }

    /// Reads a 32-bit length-prefixed string: a little-endian `u32`
    /// count `L`, then `L` bytes, matching `DataInputStream::readCStr`
    /// (`read(&len, sizeof(U32))` followed by `read(string, len)` and an
    /// in-place null terminator).
    fn read_cstr(&mut self) -> io::Result<String> {
        let len = self.read_u32()? as usize;
        let mut out = vec![0u8; len];
        self.read(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn read_f32(&mut self) -> io::Result<f32> {
        let mut buf = [0u8; 4];
        self.read(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn read_f64(&mut self) -> io::Result<f64> {
        let mut buf = [0u8; 8];
        self.read(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn read_i32(&mut self) -> io::Result<i32> {
        let mut buf = [0u8; 4];
        self.read(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_i64(&mut self) -> io::Result<i64> {
        let mut buf = [0u8; 8];
        self.read(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    fn read_u32(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64(&mut self) -> io::Result<u64> {
        let mut buf = [0u8; 8];
        self.read(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
}

/// Fixed-width writes layered on top of [`OutputStream`].
pub trait DataOutputStream: OutputStream {
    fn write_bool(&mut self, value: bool) -> io::Result<usize> {
        self.write(&[value as u8])
    }

    fn write_char(&mut self, value: u8) -> io::Result<usize> {
        self.write(&[value])
    }

    /// Mirrors [`DataInputStream::read_cstr`]'s wire format: a `u32`
    /// length prefix followed by the raw bytes (no trailing NUL on the
    /// wire — the reader null-terminates its own in-memory copy).
    fn write_cstr(&mut self, value: &str) -> io::Result<usize> {
        let bytes = value.as_bytes();
        let mut written = self.write_u32(bytes.len() as u32)?;
        written += self.write(bytes)?;
        Ok(written)
    }

    fn write_f32(&mut self, value: f32) -> io::Result<usize> {
        self.write(&value.to_le_bytes())
    }

    fn write_f64(&mut self, value: f64) -> io::Result<usize> {
        self.write(&value.to_le_bytes())
    }

    fn write_i32(&mut self, value: i32) -> io::Result<usize> {
        self.write(&value.to_le_bytes())
    }

    fn write_i64(&mut self, value: i64) -> io::Result<usize> {
        self.write(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> io::Result<usize> {
        self.write(&value.to_le_bytes())
    }

    fn write_u64(&mut self, value: u64) -> io::Result<usize> {
        self.write(&value.to_le_bytes())
    }
}

/// An object that knows how to read and write itself against a data
/// stream. Mirrors `Serialisable`.
pub trait Serializable {
    fn read_from(&mut self, input: &mut dyn DataInputStream) -> io::Result<usize>;
    fn write_to(&self, output: &mut dyn DataOutputStream) -> io::Result<usize>;
}

/// A file-backed stream descriptor. Grounded on `filedescriptor.h`:
/// opening an already-open descriptor in a conflicting mode is an
/// error here rather than the original's silent no-op, since a typed
/// `Result` can actually surface that to a caller.
pub struct FileDescriptor {
    path: PathBuf,
    mode: Option<String>,
    file: Option<File>,
}

impl FileDescriptor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: None,
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    /// Opens the file in `mode` (one of `"r"`, `"w"`, `"a"`, `"r+"`).
    /// Re-opening in the same mode is a no-op; re-opening in a
    /// different mode while already open is rejected rather than
    /// silently reusing the stale handle.
    pub fn open(&mut self, mode: &str) -> CadenceResult<()> {
        if let Some(current) = &self.mode {
            if current == mode {
                return Ok(());
            }
            return Err(CadenceError::StreamAlreadyOpen(current.clone()));
        }

        let mut options = OpenOptions::new();
        match mode {
            "r" => {
                options.read(true);
            }
            "w" => {
                options.write(true).create(true).truncate(true);
            }
            "a" => {
                options.append(true).create(true);
            }
            "r+" => {
                options.read(true).write(true).create(true);
            }
            other => {
                return Err(CadenceError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unsupported file mode: {other}"),
                )))
            }
        }

        let file = options.open(&self.path)?;
        self.file = Some(file);
        self.mode = Some(mode.to_string());
        Ok(())
    }

    pub fn close(&mut self) {
        self.file = None;
        self.mode = None;
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.file {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl InputStream for FileDescriptor {
    fn can_read(&self) -> bool {
        self.is_open()
    }

    fn close(&mut self) {
        FileDescriptor::close(self)
    }

    fn is_positionable(&self) -> bool {
        true
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        match &mut self.file {
            Some(file) => file.read(buffer),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "file not open")),
        }
    }

    fn rewind(&mut self, bytes: usize) -> io::Result<usize> {
        match &mut self.file {
            Some(file) => {
                let pos = file.seek(SeekFrom::Current(-(bytes as i64)))?;
                Ok(pos as usize)
            }
            None => Ok(0),
        }
    }
}

impl OutputStream for FileDescriptor {
    fn can_write(&self) -> bool {
        self.is_open()
    }

    fn close(&mut self) {
        FileDescriptor::close(self)
    }

    fn flush(&mut self) -> io::Result<()> {
        FileDescriptor::flush(self)
    }

    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        match &mut self.file {
            Some(file) => file.write(buffer),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "file not open")),
        }
    }
}

impl DataInputStream for FileDescriptor {}
impl DataOutputStream for FileDescriptor {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopening_in_a_different_mode_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("cadence-fd-test-{:?}", std::thread::current().id()));
        let mut fd = FileDescriptor::new(&path);
        fd.open("w").expect("should open for write");
        assert!(matches!(
            fd.open("r"),
            Err(CadenceError::StreamAlreadyOpen(_))
        ));
        fd.close();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reopening_in_the_same_mode_is_a_no_op() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("cadence-fd-test-same-{:?}", std::thread::current().id()));
        let mut fd = FileDescriptor::new(&path);
        fd.open("w").expect("should open for write");
        fd.open("w").expect("reopening in the same mode should succeed");
        fd.close();
        let _ = std::fs::remove_file(&path);
    }
}
