//! Constants and limits for rebuffered streams

use serde::{Deserialize, Serialize};

/// Default number of bytes requested from a channel per read call (128 KiB)
pub const DEFAULT_READ_CHUNK: usize = 128 * 1024;

/// Upper bound on a single channel read request
///
/// Larger configured chunks are clamped to this value.
pub const MAX_READ_CHUNK: usize = 16 * 1024 * 1024;

/// Capability set advertised by a byte channel (stored as a single byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capabilities
    pub const NONE: u8 = 0b0000_0000;

    /// Channel produces bytes through `read`
    pub const READ: u8 = 0b0000_0001;

    /// Channel accepts bytes through `write`
    pub const WRITE: u8 = 0b0000_0010;

    /// Channel can reposition its cursor through `seek`
    pub const SEEK: u8 = 0b0000_0100;

    /// Channel can report its total length
    pub const LENGTH: u8 = 0b0000_1000;

    /// Create capabilities from a raw byte
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// Get the raw capability byte
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Check if the channel is readable
    pub const fn readable(&self) -> bool {
        (self.0 & Self::READ) != 0
    }

    /// Check if the channel is writable
    pub const fn writable(&self) -> bool {
        (self.0 & Self::WRITE) != 0
    }

    /// Check if the channel supports native seeking
    pub const fn seekable(&self) -> bool {
        (self.0 & Self::SEEK) != 0
    }

    /// Check if the channel can report its length
    pub const fn sized(&self) -> bool {
        (self.0 & Self::LENGTH) != 0
    }

    /// Return a copy with the given bits added
    pub const fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }

    /// Return a copy with the given bits removed
    pub const fn without(self, bits: u8) -> Self {
        Self(self.0 & !bits)
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self(Self::NONE)
    }
}
