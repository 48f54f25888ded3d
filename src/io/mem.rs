//! An in-memory stream implementing the [`InputStream`]/[`OutputStream`]
//! family, adapted from the teacher's `io/mem` module down to the one
//! thing this crate's tests and examples need: a byte buffer that reads
//! and writes like any other stream, with no filesystem involved.

use std::io::{self, Cursor, Read, Write};

use crate::io::stream::{DataInputStream, DataOutputStream, InputStream, OutputStream};

/// A readable, rewindable view over an owned byte buffer.
pub struct MemoryInputStream {
    cursor: Cursor<Vec<u8>>,
    open: bool,
}

impl MemoryInputStream {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            cursor: Cursor::new(bytes.into()),
            open: true,
        }
    }
}

impl InputStream for MemoryInputStream {
    fn can_read(&self) -> bool {
        self.open && (self.cursor.position() as usize) < self.cursor.get_ref().len()
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_positionable(&self) -> bool {
        true
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "stream closed"));
        }
        self.cursor.read(buffer)
    }

    fn rewind(&mut self, bytes: usize) -> io::Result<usize> {
        let pos = self.cursor.position().saturating_sub(bytes as u64);
        self.cursor.set_position(pos);
        Ok(pos as usize)
    }
}

impl DataInputStream for MemoryInputStream {}

/// A growable, writable in-memory byte sink.
pub struct MemoryOutputStream {
    buffer: Vec<u8>,
    open: bool,
}

impl MemoryOutputStream {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            open: true,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for MemoryOutputStream {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputStream for MemoryOutputStream {
    fn can_write(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.buffer)
    }

    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "stream closed"));
        }
        self.buffer.write(buffer)
    }
}

impl DataOutputStream for MemoryOutputStream {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_what_was_written() {
        let mut out = MemoryOutputStream::new();
        out.write_u32(7).unwrap();
        out.write_u32(9).unwrap();

        let mut input = MemoryInputStream::new(out.into_inner());
        assert_eq!(input.read_u32().unwrap(), 7);
        assert_eq!(input.read_u32().unwrap(), 9);
    }

    #[test]
    fn cstr_round_trips_with_length_prefix() {
        let mut out = MemoryOutputStream::new();
        out.write_cstr("hello").unwrap();
        assert_eq!(out.as_slice().len(), 4 + 5);

        let mut input = MemoryInputStream::new(out.into_inner());
        assert_eq!(input.read_cstr().unwrap(), "hello");
    }

    #[test]
    fn rewind_moves_position_back() {
        let mut input = MemoryInputStream::new(vec![1, 2, 3, 4]);
        let mut buf = [0u8; 2];
        input.read(&mut buf).unwrap();
        assert_eq!(buf, [1, 2]);
        input.rewind(2).unwrap();
        input.read(&mut buf).unwrap();
        assert_eq!(buf, [1, 2]);
    }
}
