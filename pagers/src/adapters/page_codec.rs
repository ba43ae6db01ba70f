//! Slot encoding for swapped-out pages.
//!
//! A slot holds the page's fields as a postcard-encoded vector followed by
//! a little-endian CRC-32 (Castagnoli) of the encoded bytes.
//!
//! ```text
//! +---------------------------+----------------+
//! | postcard(Vec<Field>)      | crc32c (LE u32) |
//! +---------------------------+----------------+
//! ```

use crate::domain::entities::Field;
use crate::domain::error::SwapError;
use crate::domain::value_objects::SwapSlot;
use crc::{CRC_32_ISCSI, Crc};

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

const CHECKSUM_LEN: usize = 4;

/// Encode `fields` for storage in a slot.
pub fn encode(fields: &[Field]) -> Result<Vec<u8>, SwapError> {
    let mut bytes = postcard::to_allocvec(fields)?;
    let checksum = CASTAGNOLI.checksum(&bytes);
    bytes.extend_from_slice(&checksum.to_le_bytes());
    Ok(bytes)
}

/// Decode the contents of `slot`, verifying its checksum.
pub fn decode(slot: SwapSlot, bytes: &[u8]) -> Result<Vec<Field>, SwapError> {
    if bytes.len() < CHECKSUM_LEN {
        return Err(SwapError::Truncated { slot });
    }
    let (payload, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = CASTAGNOLI.checksum(payload);
    if expected != actual {
        return Err(SwapError::Corrupt {
            slot,
            expected,
            actual,
        });
    }
    Ok(postcard::from_bytes(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Field> {
        vec![
            Field::Null,
            Field::Bool(true),
            Field::Int(-7),
            Field::Float(1.5),
            Field::from("page"),
            Field::Bytes(vec![1, 2, 3]),
        ]
    }

    #[test]
    fn test_decode_encoded() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(decode(SwapSlot::new(0), &bytes).unwrap(), sample());
    }

    #[test]
    fn test_detects_corruption() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[2] ^= 0xff;
        assert!(matches!(
            decode(SwapSlot::new(4), &bytes),
            Err(SwapError::Corrupt { slot, .. }) if slot == SwapSlot::new(4)
        ));
    }

    #[test]
    fn test_detects_truncation() {
        assert!(matches!(
            decode(SwapSlot::new(1), &[0, 1]),
            Err(SwapError::Truncated { .. })
        ));
    }
}
