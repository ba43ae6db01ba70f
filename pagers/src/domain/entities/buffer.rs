//! Field-addressable storage.

use super::Field;
use crate::domain::value_objects::{Position, Region, Size, Space};
use core::fmt;

/// An ordered, fixed-capacity sequence of fields over its own region.
///
/// A buffer is not internally synchronized. Paged areas keep their page
/// buffers behind the area lock; callers own theirs.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    region: Region,
    fields: Vec<Field>,
}

impl Buffer {
    /// Create a buffer over `region`, every field `Null`.
    pub fn new(region: Region) -> Self {
        Self {
            region,
            fields: vec![Field::Null; region.len() as usize],
        }
    }

    /// Create a buffer of `len` `Null` fields starting at the origin of `space`.
    pub fn with_len(space: Space, len: u64) -> Self {
        // An origin-based region only fails for lengths no buffer could hold.
        let region = space
            .region_of(space.origin(), Size::new(len))
            .unwrap_or_else(|_| space.empty());
        Self::new(region)
    }

    /// Create a buffer holding `fields`, the first at `start`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagers::{Buffer, Field, Position, Space};
    ///
    /// let buffer = Buffer::from_fields(Space::default(), Position::new(4), vec![Field::Int(1), Field::Int(2)]);
    /// assert_eq!(buffer.get(Position::new(5)).unwrap(), &Field::Int(2));
    /// assert!(buffer.get(Position::new(3)).is_err());
    /// ```
    pub fn from_fields(space: Space, start: Position, fields: Vec<Field>) -> Self {
        let region = space
            .region_of(start, Size::new(fields.len() as u64))
            .unwrap_or_else(|_| space.empty());
        if region.is_empty() {
            return Self {
                region,
                fields: Vec::new(),
            };
        }
        Self { region, fields }
    }

    /// Region covered by this buffer.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the buffer holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields in position order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn offset(&self, position: Position) -> Result<usize, BufferError> {
        if !self.region.contains(position) {
            return Err(BufferError::OutOfBounds {
                position,
                region: self.region,
            });
        }
        Ok(position.offset_from(self.region.start()).count() as usize)
    }

    /// The field at `position`.
    pub fn get(&self, position: Position) -> Result<&Field, BufferError> {
        let offset = self.offset(position)?;
        Ok(&self.fields[offset])
    }

    /// Replace the field at `position`.
    pub fn set(&mut self, position: Position, field: Field) -> Result<(), BufferError> {
        let offset = self.offset(position)?;
        self.fields[offset] = field;
        Ok(())
    }

    /// Fields covering `region`, which must lie inside this buffer.
    pub fn slice(&self, region: &Region) -> Result<&[Field], BufferError> {
        if region.is_empty() {
            return Ok(&[]);
        }
        let first = self.offset(region.start())?;
        let last = self.offset(region.end())?;
        Ok(&self.fields[first..=last])
    }

    /// Reset every field to `Null`.
    pub fn clear(&mut self) {
        self.fields.iter_mut().for_each(|field| *field = Field::Null);
    }

    /// Take the fields out of the buffer.
    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }
}

/// Errors addressing a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BufferError {
    /// The position lies outside the buffer.
    OutOfBounds {
        /// Requested position.
        position: Position,
        /// Region of the buffer.
        region: Region,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { position, region } => {
                write!(f, "{} lies outside buffer {}", position, region)
            }
        }
    }
}

impl core::error::Error for BufferError {}
