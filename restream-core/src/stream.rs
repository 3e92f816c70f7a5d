//! Rebuffered stream over a byte channel
//!
//! [`RebufferedStream`] presents a randomly addressable virtual stream on top
//! of a channel that may only support sequential reads and writes. Bytes are
//! kept in a window covering `[base, high_water)`:
//!
//! - reads past `high_water` pull sequential chunks from the channel
//! - writes overwrite retained bytes in place or extend the window, and the
//!   written span stays dirty until it leaves the window or the stream closes
//! - seeks anywhere in `[base, high_water]` are free; forward seeks fill
//! - with a tail cutoff, the window start trails the cursor by at most the
//!   cutoff; the evicted prefix is flushed first, in ascending offset order
//!
//! Every operation either completes or leaves the cursor, the window start
//! and the dirty set as they were. The one exception is dirty bytes the
//! channel accepted before a failing flush: they stay clean, so a sequential
//! sink never receives them twice.

use crate::channel::ByteChannel;
use crate::config::StreamConfig;
use crate::constants::Capabilities;
use crate::error::StreamError;
use crate::stats::StreamStats;
use crate::window::Window;
use crate::Result;
use bytes::Bytes;
use core::ops::Range;
use std::io;

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Reference point for [`RebufferedStream::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Offset is absolute
    Start,
    /// Offset is relative to the cursor
    Current,
    /// Offset is relative to the end of the stream
    End,
}

/// Bounded-memory, seekable view over a sequential byte channel
#[derive(Debug)]
pub struct RebufferedStream<C: ByteChannel> {
    channel: Option<C>,
    caps: Capabilities,
    config: StreamConfig,
    window: Window,
    cursor: u64,

    /// Stream offset the channel's next read yields. `None` until a seekable
    /// channel has been positioned.
    source_pos: Option<u64>,

    /// Stream offset the channel's next write lands at
    sink_pos: Option<u64>,

    /// Offset at which the channel reported end of data
    source_end: Option<u64>,

    stats: StreamStats,
}

impl<C: ByteChannel> RebufferedStream<C> {
    /// Create a stream that retains everything it sees
    pub fn new(channel: C) -> Self {
        Self::build(channel, StreamConfig::default())
    }

    /// Create a stream whose window trails the cursor by at most `cutoff` bytes
    pub fn with_tail_cutoff(channel: C, cutoff: usize) -> Self {
        Self::build(channel, StreamConfig::default().tail_cutoff(cutoff))
    }

    /// Create a stream from an explicit configuration
    pub fn with_config(channel: C, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(channel, config))
    }

    fn build(channel: C, config: StreamConfig) -> Self {
        let caps = channel.capabilities();
        // A seekable channel's cursor is unknown until we place it; sequential
        // channels start at offset zero by definition.
        let start = if caps.seekable() { None } else { Some(0) };

        #[cfg(feature = "logging")]
        debug!(
            "Opening rebuffered stream (caps={:#06b}, tail_cutoff={:?}, read_chunk={})",
            caps.as_u8(),
            config.tail_cutoff,
            config.read_chunk
        );

        Self {
            channel: Some(channel),
            caps,
            config,
            window: Window::new(),
            cursor: 0,
            source_pos: start,
            sink_pos: start,
            source_end: None,
            stats: StreamStats::default(),
        }
    }

    /// Read exactly `n` bytes at the cursor and advance past them
    ///
    /// Fails with [`StreamError::ShortRead`] if the channel ends first; the
    /// error carries the bytes that were available and the cursor does not
    /// move.
    pub fn read(&mut self, n: usize) -> Result<Bytes> {
        self.ensure_open()?;
        if n == 0 {
            return Ok(Bytes::new());
        }

        let start = self.cursor;
        let end = start.saturating_add(n as u64);
        self.fill_to(end)?;

        let high_water = self.window.high_water();
        if high_water < end {
            #[cfg(feature = "logging")]
            debug!(
                "Short read at offset {}: wanted {} bytes, {} available",
                start,
                n,
                high_water - start
            );
            return Err(StreamError::ShortRead {
                requested: n,
                partial: Bytes::copy_from_slice(self.window.slice(start..high_water)),
            });
        }

        let data = Bytes::copy_from_slice(self.window.slice(start..end));
        self.evict_for(end)?;
        self.cursor = end;
        Ok(data)
    }

    /// Write `data` at the cursor and advance past it
    ///
    /// Bytes below the high-water mark are overwritten in place, the rest
    /// extend the window. Returns the number of bytes accepted, which is
    /// always `data.len()`.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        if data.is_empty() {
            return Ok(0);
        }
        if !self.caps.writable() {
            return Err(StreamError::ChannelWrite("channel is not writable".into()));
        }

        let start = self.cursor;
        let end = start + data.len() as u64;
        let undo = self.window.write_at(start, data);

        if let Err(e) = self.evict_for(end) {
            #[cfg(feature = "logging")]
            warn!("Rolling back write of {} bytes at offset {}: {}", data.len(), start, e);
            self.window.undo(undo);
            return Err(e);
        }

        self.cursor = end;
        self.stats.observe_window(self.window.len());
        Ok(data.len())
    }

    /// Move the cursor and return its new absolute value
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.ensure_open()?;

        let origin = match whence {
            Whence::Start => 0,
            Whence::Current => self.cursor,
            Whence::End => self.extent()?,
        };

        let resolved = origin as i128 + offset as i128;
        if resolved < 0 {
            return Err(StreamError::NegativeSeek(
                i64::try_from(resolved).unwrap_or(i64::MIN),
            ));
        }
        let target = u64::try_from(resolved).map_err(|_| StreamError::SeekBeyondAvailable {
            target: u64::MAX,
            available: self.window.high_water(),
        })?;

        let base = self.window.base();
        if target < base {
            return Err(StreamError::SeekOutOfWindow { target, base });
        }

        if target <= self.window.high_water() {
            // Backward moves never evict; forward moves inside the window may
            self.evict_for(target)?;
            self.cursor = target;
            return Ok(target);
        }

        self.fill_to(target)?;
        let high_water = self.window.high_water();
        if high_water < target {
            return Err(StreamError::SeekBeyondAvailable {
                target,
                available: high_water,
            });
        }

        self.evict_for(target)?;
        self.cursor = target;
        Ok(target)
    }

    /// Current cursor position
    pub fn tell(&self) -> u64 {
        self.cursor
    }

    /// Flush every dirty byte, flush the channel and release it
    ///
    /// Calling `close` again is a no-op. The channel is released even if the
    /// final flush fails; that failure is returned.
    pub fn close(&mut self) -> Result<()> {
        if self.channel.is_none() {
            return Ok(());
        }

        let result = self.flush_all();
        self.channel = None;

        #[cfg(feature = "logging")]
        match &result {
            Ok(()) => debug!(
                "Closed stream at offset {} ({} bytes flushed in total)",
                self.cursor, self.stats.bytes_flushed
            ),
            Err(e) => warn!("Stream teardown failed: {}", e),
        }

        result
    }

    /// Close the stream and hand back the channel
    pub fn into_channel(mut self) -> Result<C> {
        self.ensure_open()?;
        let result = self.flush_all();
        // Released either way so Drop does not flush a second time
        let channel = self.channel.take().ok_or(StreamError::StreamClosed)?;

        #[cfg(feature = "logging")]
        if let Err(e) = &result {
            warn!("Stream teardown failed: {}", e);
        }

        result.map(|()| channel)
    }

    /// Check if the stream has been torn down
    pub fn is_closed(&self) -> bool {
        self.channel.is_none()
    }

    /// Borrow the channel while the stream is open
    pub fn get_ref(&self) -> Option<&C> {
        self.channel.as_ref()
    }

    /// Lowest offset still addressable
    pub fn cached_from(&self) -> u64 {
        self.window.base()
    }

    /// One past the highest offset held in memory
    pub fn cached_to(&self) -> u64 {
        self.window.high_water()
    }

    /// Number of bytes held in memory
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Ranges written but not yet flushed, ascending
    pub fn dirty_ranges(&self) -> Vec<Range<u64>> {
        self.window.dirty().iter().cloned().collect()
    }

    /// Configured tail cutoff
    pub fn tail_cutoff(&self) -> Option<usize> {
        self.config.tail_cutoff
    }

    /// Stream configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Channel and window counters
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    fn ensure_open(&self) -> Result<()> {
        if self.channel.is_none() {
            return Err(StreamError::StreamClosed);
        }
        Ok(())
    }

    fn channel_mut(&mut self) -> Result<&mut C> {
        self.channel.as_mut().ok_or(StreamError::StreamClosed)
    }

    /// Total length of the stream, if it can be determined without reading
    /// the channel to its end
    fn extent(&mut self) -> Result<u64> {
        let high_water = self.window.high_water();
        if let Some(end) = self.source_end {
            return Ok(end.max(high_water));
        }
        if !self.caps.readable() {
            return Ok(high_water);
        }
        if self.caps.sized() {
            let length = self
                .channel_mut()?
                .length()
                .map_err(StreamError::read_failure)?;
            if let Some(length) = length {
                return Ok(length.max(high_water));
            }
        }
        Err(StreamError::UnknownExtent)
    }

    /// Pull channel data until the window reaches `target` or the channel
    /// runs dry
    fn fill_to(&mut self, target: u64) -> Result<()> {
        let chunk = self.config.effective_read_chunk();

        while self.window.high_water() < target {
            if !self.caps.readable() {
                break;
            }
            let high_water = self.window.high_water();
            if self.source_end.map_or(false, |end| high_water >= end) {
                break;
            }
            if !self.position_source(high_water)? {
                break;
            }

            let data = self.channel_read(chunk)?;
            if data.is_empty() {
                #[cfg(feature = "logging")]
                debug!("Channel reached end of data at offset {}", high_water);
                self.source_end = Some(high_water);
                break;
            }

            #[cfg(feature = "logging")]
            trace!("Filled {} bytes at offset {}", data.len(), high_water);

            self.window.append_clean(&data);
            self.advance_source(data.len() as u64);
            self.stats.bytes_read += data.len() as u64;
        }

        self.stats.observe_window(self.window.len());
        Ok(())
    }

    /// Line the channel's read side up with `offset`
    ///
    /// Returns `false` if the channel ended before reaching it.
    fn position_source(&mut self, offset: u64) -> Result<bool> {
        if self.source_pos == Some(offset) {
            return Ok(true);
        }

        if self.caps.seekable() {
            self.channel_mut()?
                .seek(offset)
                .map_err(StreamError::read_failure)?;
            self.source_pos = Some(offset);
            self.sink_pos = Some(offset);
            return Ok(true);
        }

        let pos = self.source_pos.unwrap_or(0);
        if pos > offset {
            return Err(StreamError::ChannelRead(format!(
                "channel read position {} is past offset {} and cannot seek",
                pos, offset
            )));
        }

        // Offsets the caller already wrote shadow the channel's bytes there;
        // consume and drop them.
        let chunk = self.config.effective_read_chunk();
        let mut pos = pos;
        while pos < offset {
            let want = ((offset - pos) as usize).min(chunk);
            let data = self.channel_read(want)?;
            if data.is_empty() {
                self.source_pos = Some(pos);
                self.source_end = Some(pos);
                return Ok(false);
            }
            pos += data.len() as u64;
            self.stats.bytes_skipped += data.len() as u64;
        }

        #[cfg(feature = "logging")]
        trace!("Skipped channel bytes up to offset {}", offset);

        self.source_pos = Some(pos);
        Ok(true)
    }

    fn advance_source(&mut self, n: u64) {
        let pos = self.source_pos.unwrap_or(0) + n;
        self.source_pos = Some(pos);
        if self.caps.seekable() {
            self.sink_pos = Some(pos);
        }
    }

    fn channel_read(&mut self, max_len: usize) -> Result<Bytes> {
        let channel = self.channel_mut()?;
        let data = loop {
            match channel.read(max_len) {
                Ok(data) => break data,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::read_failure(e)),
            }
        };
        self.stats.channel_reads += 1;
        Ok(data)
    }

    /// Evict whatever the tail cutoff requires once the cursor sits at
    /// `cursor`. Dirty bytes in the evicted prefix are flushed first; if a
    /// flush fails nothing is evicted.
    fn evict_for(&mut self, cursor: u64) -> Result<()> {
        let Some(cutoff) = self.config.tail_cutoff else {
            return Ok(());
        };
        let base = self.window.base();
        if cursor - base <= cutoff as u64 {
            return Ok(());
        }

        let new_base = cursor - cutoff as u64;
        for range in self.window.dirty_below(new_base) {
            self.flush_range(range)?;
        }

        let evicted = self.window.evict_to(new_base);
        self.stats.bytes_evicted += evicted as u64;

        #[cfg(feature = "logging")]
        trace!("Evicted {} bytes, window now starts at {}", evicted, new_base);

        Ok(())
    }

    /// Flush every dirty range in ascending order, then the channel itself
    fn flush_all(&mut self) -> Result<()> {
        let high_water = self.window.high_water();
        for range in self.window.dirty_below(high_water) {
            self.flush_range(range)?;
        }
        self.channel_mut()?
            .flush()
            .map_err(StreamError::write_failure)
    }

    /// Hand one dirty range to the channel and mark it clean
    ///
    /// On failure the prefix the channel already accepted is still marked
    /// clean, so a retry resumes after it instead of sending it again.
    fn flush_range(&mut self, range: Range<u64>) -> Result<()> {
        self.position_sink(range.start)?;

        let channel = self.channel.as_mut().ok_or(StreamError::StreamClosed)?;
        let data = self.window.slice(range.clone());
        let mut sent = 0;
        let mut failure = None;
        while sent < data.len() {
            match channel.write(&data[sent..]) {
                Ok(0) => {
                    failure = Some(StreamError::ChannelWrite(
                        "channel accepted zero bytes".into(),
                    ));
                    break;
                }
                Ok(n) => {
                    sent += n;
                    self.stats.channel_writes += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    failure = Some(StreamError::write_failure(e));
                    break;
                }
            }
        }

        let end = range.start + sent as u64;
        if sent > 0 {
            self.sink_pos = Some(end);
            if self.caps.seekable() {
                self.source_pos = Some(end);
            }
            self.stats.bytes_flushed += sent as u64;
            self.window.mark_clean(range.start, end);
        }

        match failure {
            Some(e) => {
                #[cfg(feature = "logging")]
                debug!(
                    "Flush at offset {} stopped after {} of {} bytes",
                    range.start,
                    sent,
                    range.end - range.start
                );
                Err(e)
            }
            None => {
                #[cfg(feature = "logging")]
                trace!("Flushed {} dirty bytes at offset {}", sent, range.start);
                Ok(())
            }
        }
    }

    /// Line the channel's write side up with `offset`
    fn position_sink(&mut self, offset: u64) -> Result<()> {
        if self.sink_pos == Some(offset) {
            return Ok(());
        }

        if self.caps.seekable() {
            self.channel_mut()?
                .seek(offset)
                .map_err(StreamError::write_failure)?;
            self.sink_pos = Some(offset);
            self.source_pos = Some(offset);
            return Ok(());
        }

        // Sequential sinks carry no offsets: the range simply follows the
        // previous one.
        #[cfg(feature = "logging")]
        debug!(
            "Sequential sink at offset {:?} receives dirty range starting at {}",
            self.sink_pos, offset
        );
        Ok(())
    }
}

impl<C: ByteChannel> Drop for RebufferedStream<C> {
    fn drop(&mut self) {
        if self.channel.is_some() {
            // Errors are logged by close
            let _ = self.close();
        }
    }
}

impl<C: ByteChannel> io::Read for RebufferedStream<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = match RebufferedStream::read(self, buf.len()) {
            Ok(data) => data,
            Err(StreamError::ShortRead { partial, .. }) if partial.is_empty() => return Ok(0),
            Err(StreamError::ShortRead { partial, .. }) => {
                RebufferedStream::read(self, partial.len())?
            }
            Err(e) => return Err(e.into()),
        };
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

impl<C: ByteChannel> io::Write for RebufferedStream<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(RebufferedStream::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.channel_mut()?.flush()
    }
}

impl<C: ByteChannel> io::Seek for RebufferedStream<C> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            io::SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek offset overflows i64")
                })?;
                (offset, Whence::Start)
            }
            io::SeekFrom::Current(offset) => (offset, Whence::Current),
            io::SeekFrom::End(offset) => (offset, Whence::End),
        };
        Ok(RebufferedStream::seek(self, offset, whence)?)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.cursor)
    }
}
