//! In-memory window over a contiguous range of stream offsets
//!
//! The window holds the bytes of `[base, high_water)` and remembers which of
//! them were written by the caller and still need to reach the channel. It
//! performs no I/O: filling, flushing and eviction decisions belong to the
//! stream.
//!
//! # Invariants
//! - `buf.len() == high_water - base`.
//! - Every dirty range lies inside `[base, high_water)`.
//! - `base` only grows.

use crate::ranges::RangeSet;
use bytes::{Buf, BytesMut};
use core::ops::Range;

/// Retained byte range of a stream plus dirty tracking
#[derive(Debug, Default)]
pub struct Window {
    base: u64,
    buf: BytesMut,
    dirty: RangeSet,
}

/// State captured by [`Window::write_at`] so the write can be undone
#[derive(Debug)]
pub struct WriteUndo {
    offset: u64,
    overwritten: Vec<u8>,
    high_water: u64,
    dirty: RangeSet,
}

impl Window {
    /// Create an empty window starting at offset zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest retained offset
    pub fn base(&self) -> u64 {
        self.base
    }

    /// One past the highest retained offset
    pub fn high_water(&self) -> u64 {
        self.base + self.buf.len() as u64
    }

    /// Number of retained bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Dirty ranges, ascending
    pub fn dirty(&self) -> &RangeSet {
        &self.dirty
    }

    /// Borrow the retained bytes of `range`
    ///
    /// The range must lie within `[base, high_water]`.
    pub fn slice(&self, range: Range<u64>) -> &[u8] {
        debug_assert!(range.start >= self.base && range.end <= self.high_water());
        let lo = (range.start - self.base) as usize;
        let hi = (range.end - self.base) as usize;
        &self.buf[lo..hi]
    }

    /// Append bytes obtained from the channel; they start out clean
    pub fn append_clean(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Write `data` at `offset`, overwriting retained bytes and extending the
    /// window past `high_water` as needed. The whole span becomes dirty.
    ///
    /// `offset` must lie within `[base, high_water]`.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> WriteUndo {
        debug_assert!(offset >= self.base && offset <= self.high_water());

        let high_water = self.high_water();
        let end = offset + data.len() as u64;
        let overlap_end = end.min(high_water);
        let overlap = (overlap_end - offset) as usize;

        let undo = WriteUndo {
            offset,
            overwritten: self.slice(offset..overlap_end).to_vec(),
            high_water,
            dirty: self.dirty.clone(),
        };

        let start = (offset - self.base) as usize;
        self.buf[start..start + overlap].copy_from_slice(&data[..overlap]);
        self.buf.extend_from_slice(&data[overlap..]);
        self.dirty.insert(offset, end);

        undo
    }

    /// Revert a write made by [`Window::write_at`]
    ///
    /// Ranges marked clean since the write already reached the channel and
    /// stay clean. Only valid while the window has not been evicted or
    /// written since that write.
    pub fn undo(&mut self, undo: WriteUndo) {
        let keep = (undo.high_water - self.base) as usize;
        self.buf.truncate(keep);
        let start = (undo.offset - self.base) as usize;
        self.buf[start..start + undo.overwritten.len()].copy_from_slice(&undo.overwritten);
        self.dirty = undo.dirty.intersection(&self.dirty);
    }

    /// Dirty ranges clipped to `[base, end)`, ascending
    pub fn dirty_below(&self, end: u64) -> Vec<Range<u64>> {
        self.dirty.clipped(self.base, end)
    }

    /// Mark `[start, end)` as flushed
    pub fn mark_clean(&mut self, start: u64, end: u64) {
        self.dirty.remove(start, end);
    }

    /// Drop every retained byte below `new_base`
    ///
    /// The dropped prefix must be clean. Returns the number of bytes dropped.
    pub fn evict_to(&mut self, new_base: u64) -> usize {
        if new_base <= self.base {
            return 0;
        }
        debug_assert!(new_base <= self.high_water());
        debug_assert!(self.dirty.clipped(self.base, new_base).is_empty());

        let n = (new_base - self.base) as usize;
        self.buf.advance(n);
        self.base = new_base;
        n
    }
}
