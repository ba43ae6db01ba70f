//! Streaming access to paged areas.

mod field_stream;

pub use field_stream::FieldStream;

use crate::domain::MemoryError;
use core::fmt;

/// Error type for streaming operations.
#[derive(Debug)]
#[non_exhaustive]
pub enum StreamError {
    /// The paged area failed.
    Memory(MemoryError),
    /// Invalid seek position.
    InvalidSeek,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(e) => write!(f, "Paged area error: {}", e),
            Self::InvalidSeek => write!(f, "Invalid seek position"),
        }
    }
}

impl core::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Memory(e) => Some(e),
            Self::InvalidSeek => None,
        }
    }
}

impl From<MemoryError> for StreamError {
    fn from(e: MemoryError) -> Self {
        Self::Memory(e)
    }
}

/// Seek position for stream operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    /// Offset from the start of the stream.
    Start(u64),
    /// Offset relative to the current position.
    Current(i64),
    /// Offset from the end of the stream.
    End(i64),
}
