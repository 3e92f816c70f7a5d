//! # Restream Core
//!
//! A bounded-memory, randomly addressable byte stream layered over a
//! sequential (possibly non-seekable) byte channel. Format engines read,
//! write, seek and backpatch through it; only a sliding window of the stream
//! is kept in memory.
//!
//! ## Modules
//!
//! - `constants`: Defaults, limits and channel capability flags
//! - `channel`: The `ByteChannel` capability trait and its adapters
//! - `ranges`: Disjoint interval set used for dirty tracking
//! - `window`: Retained byte range with dirty tracking (no I/O)
//! - `stream`: `RebufferedStream`, reads/writes/seeks with eviction and flushing
//! - `config`: Stream configuration
//! - `stats`: Channel and window counters
//! - `error`: Error taxonomy

#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
mod ranges;
pub mod stats;
pub mod stream;
mod window;

// Re-export commonly used types
pub use channel::{ByteChannel, MemoryChannel, ReadChannel, SeekableChannel, WriteChannel};
pub use config::StreamConfig;
pub use constants::Capabilities;
pub use error::StreamError;
pub use stats::StreamStats;
pub use stream::{RebufferedStream, Whence};

/// Result type alias for stream operations
pub type Result<T> = core::result::Result<T, StreamError>;
