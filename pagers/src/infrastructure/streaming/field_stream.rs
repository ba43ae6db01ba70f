//! Seekable cursor over a paged area.

use super::{SeekFrom, StreamError};
use crate::domain::{Buffer, Credentials, Field, PageTable, PagedArea, Position, Size};

/// A cursor reading and writing consecutive fields of a paged area.
///
/// Offsets are relative to the first position of the area. Reads and writes
/// that run past the end are truncated; the stream never grows the area.
///
/// # Examples
///
/// ```ignore
/// let mut stream = FieldStream::new(&area, cred);
/// stream.write(&[Field::Int(1), Field::Int(2)])?;
/// stream.seek(SeekFrom::Start(0))?;
///
/// let mut out = vec![Field::Null; 2];
/// assert_eq!(stream.read(&mut out)?, 2);
/// ```
pub struct FieldStream<'a, T: PageTable> {
    area: &'a PagedArea<T>,
    credentials: Credentials,
    position: u64,
}

impl<'a, T: PageTable> FieldStream<'a, T> {
    /// Create a stream over `area` acting as `credentials`, at offset zero.
    pub fn new(area: &'a PagedArea<T>, credentials: Credentials) -> Self {
        Self {
            area,
            credentials,
            position: 0,
        }
    }

    /// Current offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of fields in the area.
    pub fn len(&self) -> u64 {
        self.area.region().len()
    }

    /// Check whether the area is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fields left before the end, capped at `wanted`, and the absolute
    /// position of the cursor.
    fn span(&self, wanted: usize) -> Option<(Position, u64)> {
        let region = self.area.region();
        if wanted == 0 || self.position >= region.len() {
            return None;
        }
        let count = (wanted as u64).min(region.len() - self.position);
        Some((region.start().add(Size::new(self.position)), count))
    }

    /// Read fields into `out`, returning how many were read.
    pub fn read(&mut self, out: &mut [Field]) -> Result<usize, StreamError> {
        let Some((start, count)) = self.span(out.len()) else {
            return Ok(0);
        };

        let space = self.area.swap_system().space();
        let mut buffer = Buffer::with_len(space, count);
        let region = buffer.region();
        let filled = self.area.read(&self.credentials, start, &mut buffer, &region)?;

        let read = filled.len() as usize;
        for (slot, field) in out.iter_mut().zip(buffer.into_fields()).take(read) {
            *slot = field;
        }
        self.position += read as u64;
        Ok(read)
    }

    /// Write `fields`, returning how many were written.
    pub fn write(&mut self, fields: &[Field]) -> Result<usize, StreamError> {
        let Some((start, count)) = self.span(fields.len()) else {
            return Ok(0);
        };

        let space = self.area.swap_system().space();
        let buffer = Buffer::from_fields(space, space.origin(), fields[..count as usize].to_vec());
        let consumed = self
            .area
            .write(&self.credentials, start, &buffer, &buffer.region())?;

        let written = consumed.len();
        self.position += written;
        Ok(written as usize)
    }

    /// Move the cursor, returning the new offset.
    ///
    /// Seeking to the end is allowed; before the start or past the end is not.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let len = i128::from(self.len());
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.position) + i128::from(delta),
            SeekFrom::End(delta) => len + i128::from(delta),
        };
        if target < 0 || target > len {
            return Err(StreamError::InvalidSeek);
        }
        self.position = target as u64;
        Ok(self.position)
    }
}
