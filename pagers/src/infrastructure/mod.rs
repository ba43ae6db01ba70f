//! Infrastructure layer - higher-level utilities built on the domain.
//!
//! This module provides a seekable streaming cursor over a paged area, for
//! callers that think in offsets rather than positions and regions.

pub mod streaming;

pub use streaming::{FieldStream, SeekFrom, StreamError};
