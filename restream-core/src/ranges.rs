//! Sorted set of disjoint half-open offset ranges
//!
//! Used by the window to track which bytes were written by the caller but
//! not yet handed to the channel. Adjacent and overlapping inserts coalesce,
//! so the set always holds the minimal number of ranges.

use core::ops::Range;

/// A set of disjoint, sorted, non-empty `[start, end)` ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<Range<u64>>,
}

impl RangeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Iterate ranges in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &Range<u64>> {
        self.ranges.iter()
    }

    /// Add `[start, end)`, merging with any overlapping or touching ranges
    pub fn insert(&mut self, start: u64, end: u64) {
        if start >= end {
            return;
        }

        // First range that could merge: ends at or after `start`
        let lo = self.ranges.partition_point(|r| r.end < start);
        // One past the last range that could merge: starts at or before `end`
        let hi = self.ranges.partition_point(|r| r.start <= end);

        if lo == hi {
            self.ranges.insert(lo, start..end);
            return;
        }

        let merged_start = start.min(self.ranges[lo].start);
        let merged_end = end.max(self.ranges[hi - 1].end);
        self.ranges.drain(lo + 1..hi);
        self.ranges[lo] = merged_start..merged_end;
    }

    /// Remove `[start, end)`, splitting ranges that straddle either bound
    pub fn remove(&mut self, start: u64, end: u64) {
        if start >= end {
            return;
        }

        let lo = self.ranges.partition_point(|r| r.end <= start);
        let hi = self.ranges.partition_point(|r| r.start < end);
        if lo >= hi {
            return;
        }

        let head = self.ranges[lo].start;
        let tail = self.ranges[hi - 1].end;

        let mut keep = Vec::with_capacity(2);
        if head < start {
            keep.push(head..start);
        }
        if tail > end {
            keep.push(end..tail);
        }
        self.ranges.splice(lo..hi, keep);
    }

    /// Ranges intersected with `[start, end)`, in ascending order
    pub fn clipped(&self, start: u64, end: u64) -> Vec<Range<u64>> {
        if start >= end {
            return Vec::new();
        }
        let lo = self.ranges.partition_point(|r| r.end <= start);
        self.ranges[lo..]
            .iter()
            .take_while(|r| r.start < end)
            .map(|r| r.start.max(start)..r.end.min(end))
            .collect()
    }

    /// Offsets covered by both `self` and `other`
    pub fn intersection(&self, other: &RangeSet) -> RangeSet {
        let mut out = Self::new();
        for range in &self.ranges {
            // Pieces stay sorted and never touch, so no merging is needed
            out.ranges.extend(other.clipped(range.start, range.end));
        }
        out
    }
}
