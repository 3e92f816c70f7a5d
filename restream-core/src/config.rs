//! Stream configuration

use crate::constants::{DEFAULT_READ_CHUNK, MAX_READ_CHUNK};
use crate::error::StreamError;
use serde::{Deserialize, Serialize};

/// Tunables for a [`RebufferedStream`](crate::stream::RebufferedStream)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Maximum distance the cursor may lead the start of the window.
    /// `None` retains the whole stream.
    pub tail_cutoff: Option<usize>,

    /// Number of bytes requested from the channel per read
    pub read_chunk: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tail_cutoff: None,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }
}

impl StreamConfig {
    /// Create the default configuration (unbounded window)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tail cutoff
    pub fn tail_cutoff(mut self, cutoff: usize) -> Self {
        self.tail_cutoff = Some(cutoff);
        self
    }

    /// Retain the whole stream
    pub fn unbounded(mut self) -> Self {
        self.tail_cutoff = None;
        self
    }

    /// Set the channel read chunk size
    pub fn read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.read_chunk == 0 {
            return Err(StreamError::InvalidConfig(
                "read_chunk must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Read chunk clamped to the supported maximum
    pub(crate) fn effective_read_chunk(&self) -> usize {
        self.read_chunk.min(MAX_READ_CHUNK)
    }
}
