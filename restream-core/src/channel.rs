//! Byte channel capability trait and adapters
//!
//! A [`ByteChannel`] is the minimal I/O surface a stream needs: sequential
//! reads that return up to `max_len` bytes (empty meaning end of data) and
//! sequential writes. Seeking and length reporting are optional and only
//! used when [`ByteChannel::capabilities`] advertises them.
//!
//! Adapters are provided for `std::io` readers, writers and seekable handles,
//! plus [`MemoryChannel`], an in-memory seekable buffer.

use crate::constants::Capabilities;
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Sequential byte source and/or sink consumed by a stream
pub trait ByteChannel {
    /// Capabilities this channel supports
    fn capabilities(&self) -> Capabilities;

    /// Read up to `max_len` bytes; an empty result signals end of data
    fn read(&mut self, max_len: usize) -> io::Result<Bytes>;

    /// Write bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Flush any buffering inside the channel
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Move the channel cursor to an absolute offset
    fn seek(&mut self, _offset: u64) -> io::Result<u64> {
        Err(unsupported("seek"))
    }

    /// Total length of the channel's data, when known
    fn length(&mut self) -> io::Result<Option<u64>> {
        Ok(None)
    }
}

fn unsupported(op: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("channel does not support {}", op),
    )
}

/// Read up to `max_len` bytes from a `std::io` reader
fn read_chunk<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> io::Result<Bytes> {
    let mut buf = BytesMut::zeroed(max_len);
    let n = loop {
        match reader.read(&mut buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    };
    buf.truncate(n);
    Ok(buf.freeze())
}

impl<T: ByteChannel + ?Sized> ByteChannel for &mut T {
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn read(&mut self, max_len: usize) -> io::Result<Bytes> {
        (**self).read(max_len)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        (**self).seek(offset)
    }

    fn length(&mut self) -> io::Result<Option<u64>> {
        (**self).length()
    }
}

impl<T: ByteChannel + ?Sized> ByteChannel for Box<T> {
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn read(&mut self, max_len: usize) -> io::Result<Bytes> {
        (**self).read(max_len)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        (**self).seek(offset)
    }

    fn length(&mut self) -> io::Result<Option<u64>> {
        (**self).length()
    }
}

/// Forward-only source over any `std::io::Read`
#[derive(Debug)]
pub struct ReadChannel<R> {
    inner: R,
}

impl<R: Read> ReadChannel<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwrap the reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteChannel for ReadChannel<R> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(Capabilities::READ)
    }

    fn read(&mut self, max_len: usize) -> io::Result<Bytes> {
        read_chunk(&mut self.inner, max_len)
    }

    fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
        Err(unsupported("write"))
    }
}

/// Append-only sink over any `std::io::Write`
#[derive(Debug)]
pub struct WriteChannel<W> {
    inner: W,
}

impl<W: Write> WriteChannel<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Borrow the writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteChannel for WriteChannel<W> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(Capabilities::WRITE)
    }

    fn read(&mut self, _max_len: usize) -> io::Result<Bytes> {
        Err(unsupported("read"))
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Random-access channel over a readable, writable, seekable handle such as
/// a `File` or `Cursor<Vec<u8>>`
#[derive(Debug)]
pub struct SeekableChannel<T> {
    inner: T,
}

impl<T: Read + Write + Seek> SeekableChannel<T> {
    /// Wrap a seekable handle
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the handle
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Unwrap the handle
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Seek> ByteChannel for SeekableChannel<T> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(
            Capabilities::READ | Capabilities::WRITE | Capabilities::SEEK | Capabilities::LENGTH,
        )
    }

    fn read(&mut self, max_len: usize) -> io::Result<Bytes> {
        read_chunk(&mut self.inner, max_len)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        self.inner.seek(SeekFrom::Start(offset))
    }

    fn length(&mut self) -> io::Result<Option<u64>> {
        let here = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(here))?;
        Ok(Some(end))
    }
}

/// In-memory seekable channel with a single shared cursor
///
/// Reads consume from the cursor; writes overwrite at the cursor and extend
/// the buffer past its end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryChannel {
    data: Vec<u8>,
    pos: usize,
}

impl MemoryChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel holding `data`, cursor at zero
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Current channel contents
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Current channel cursor
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unwrap the contents
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl ByteChannel for MemoryChannel {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(
            Capabilities::READ | Capabilities::WRITE | Capabilities::SEEK | Capabilities::LENGTH,
        )
    }

    fn read(&mut self, max_len: usize) -> io::Result<Bytes> {
        let start = self.pos.min(self.data.len());
        let end = start.saturating_add(max_len).min(self.data.len());
        self.pos = end;
        Ok(Bytes::copy_from_slice(&self.data[start..end]))
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.pos > self.data.len() {
            self.data.resize(self.pos, 0);
        }
        let overlap = (self.data.len() - self.pos).min(data.len());
        self.data[self.pos..self.pos + overlap].copy_from_slice(&data[..overlap]);
        self.data.extend_from_slice(&data[overlap..]);
        self.pos += data.len();
        Ok(data.len())
    }

    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        self.pos = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset overflows usize"))?;
        Ok(offset)
    }

    fn length(&mut self) -> io::Result<Option<u64>> {
        Ok(Some(self.data.len() as u64))
    }
}
