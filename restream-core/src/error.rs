//! Error types for rebuffered stream operations

use bytes::Bytes;
use std::io;

/// Errors that can occur during stream operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// The requested range extends past the end of the channel's data
    #[error("Short read: requested {requested} bytes, only {} available", .partial.len())]
    ShortRead {
        /// The number of bytes requested.
        requested: usize,
        /// The bytes that were actually obtainable at the cursor.
        partial: Bytes,
    },

    /// The seek target has already been evicted from the window
    #[error("Seek to offset {target} is out of window (retained data starts at {base})")]
    SeekOutOfWindow {
        /// The resolved absolute target.
        target: u64,
        /// The lowest offset still retained.
        base: u64,
    },

    /// The seek target lies past the end of the channel's data
    #[error("Seek to offset {target} is beyond available data ({available} bytes)")]
    SeekBeyondAvailable {
        /// The resolved absolute target.
        target: u64,
        /// The extent of the data that could be obtained.
        available: u64,
    },

    /// A seek relative to the end was requested but the total length is unknown
    #[error("Cannot seek from end: stream extent is unknown")]
    UnknownExtent,

    /// The seek resolved to a position before offset zero
    #[error("Seek resolves to negative offset {0}")]
    NegativeSeek(i64),

    /// The channel failed while reading or repositioning
    #[error("Channel read error: {0}")]
    ChannelRead(String),

    /// The channel rejected a write or flush
    #[error("Channel write error: {0}")]
    ChannelWrite(String),

    /// The stream has already been torn down
    #[error("Stream is closed")]
    StreamClosed,

    /// The stream configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StreamError {
    pub(crate) fn read_failure(err: io::Error) -> Self {
        StreamError::ChannelRead(err.to_string())
    }

    pub(crate) fn write_failure(err: io::Error) -> Self {
        StreamError::ChannelWrite(err.to_string())
    }

    /// Returns the partial bytes carried by a short read, if any
    pub fn partial(&self) -> Option<&Bytes> {
        match self {
            StreamError::ShortRead { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::ShortRead { .. } => io::ErrorKind::UnexpectedEof,
            StreamError::SeekOutOfWindow { .. }
            | StreamError::SeekBeyondAvailable { .. }
            | StreamError::NegativeSeek(_)
            | StreamError::InvalidConfig(_) => io::ErrorKind::InvalidInput,
            StreamError::UnknownExtent => io::ErrorKind::Unsupported,
            StreamError::ChannelRead(_) => io::ErrorKind::Other,
            StreamError::ChannelWrite(_) => io::ErrorKind::WriteZero,
            StreamError::StreamClosed => io::ErrorKind::NotConnected,
        };
        io::Error::new(kind, err)
    }
}
