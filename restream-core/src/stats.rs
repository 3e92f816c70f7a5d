//! Channel and window counters

use serde::{Deserialize, Serialize};

/// Counters describing how a stream used its channel and window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Number of read calls issued to the channel
    pub channel_reads: u64,

    /// Bytes obtained from the channel and kept in the window
    pub bytes_read: u64,

    /// Bytes read from the channel and discarded because the caller had
    /// already written those offsets
    pub bytes_skipped: u64,

    /// Number of write calls issued to the channel
    pub channel_writes: u64,

    /// Bytes handed to the channel by flushes
    pub bytes_flushed: u64,

    /// Bytes dropped from the front of the window
    pub bytes_evicted: u64,

    /// Largest number of bytes the window ever retained
    pub peak_window: usize,
}

impl StreamStats {
    pub(crate) fn observe_window(&mut self, len: usize) {
        self.peak_window = self.peak_window.max(len);
    }
}
