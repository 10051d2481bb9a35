//! Verdict ⇄ data-block payload codec.
//!
//! Wire layout (default configuration, little-endian):
//! ```text
//! ┌───────────────────┬───────────────────┐
//! │ result (i16)      │ defect kind (i16) │
//! │ byte 0..2         │ byte 2..4         │
//! └───────────────────┴───────────────────┘
//! ```
//!
//! Offsets and byte order come from the configuration.  The buffer is
//! exactly `max(offset) + 2` bytes; bytes not covered by either field
//! are zero.

use crate::config::ByteOrder;
use crate::error::{DecodeError, LayoutError};
use crate::verdict::Verdict;

const FIELD_WIDTH: usize = 2;

/// Largest payload we are willing to address inside one data block.
pub const MAX_PAYLOAD_WIDTH: usize = 64;

/// Encodes verdicts into the data-block payload and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictEncoder {
    offset_result: usize,
    offset_defect: usize,
    byte_order: ByteOrder,
}

impl VerdictEncoder {
    /// Fails when the two fields overlap or the payload would exceed
    /// [`MAX_PAYLOAD_WIDTH`].  Every encoder that exists round-trips.
    pub fn new(offset_result: u16, offset_defect: u16, byte_order: ByteOrder) -> Result<Self, LayoutError> {
        if offset_result.abs_diff(offset_defect) < FIELD_WIDTH as u16 {
            return Err(LayoutError::Overlap {
                offset_result,
                offset_defect,
            });
        }
        let encoder = Self {
            offset_result: offset_result as usize,
            offset_defect: offset_defect as usize,
            byte_order,
        };
        if encoder.width() > MAX_PAYLOAD_WIDTH {
            return Err(LayoutError::TooWide {
                width: encoder.width(),
                max: MAX_PAYLOAD_WIDTH,
            });
        }
        Ok(encoder)
    }

    /// Total payload length in bytes.
    pub fn width(&self) -> usize {
        self.offset_result.max(self.offset_defect) + FIELD_WIDTH
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Serialise a verdict.  Total for every verdict.
    pub fn encode(&self, verdict: &Verdict) -> Payload {
        let mut bytes = vec![0u8; self.width()];
        self.put(&mut bytes, self.offset_result, verdict.result().code());
        self.put(&mut bytes, self.offset_defect, verdict.defect_kind().code());
        Payload(bytes)
    }

    /// Parse a buffer read back from the PLC.
    pub fn decode(&self, buf: &[u8]) -> Result<Verdict, DecodeError> {
        if buf.len() < self.width() {
            return Err(DecodeError::TooShort {
                needed: self.width(),
                got: buf.len(),
            });
        }
        let result = self.get(buf, self.offset_result);
        let defect_kind = self.get(buf, self.offset_defect);
        Verdict::from_codes(result, defect_kind).ok_or(if matches!(result, 1 | 2) {
            DecodeError::Inconsistent {
                result,
                defect_kind,
            }
        } else {
            DecodeError::UnknownResult(result)
        })
    }

    fn put(&self, buf: &mut [u8], offset: usize, value: i16) {
        let raw = match self.byte_order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        buf[offset..offset + FIELD_WIDTH].copy_from_slice(&raw);
    }

    fn get(&self, buf: &[u8], offset: usize) -> i16 {
        let raw = [buf[offset], buf[offset + 1]];
        match self.byte_order {
            ByteOrder::Little => i16::from_le_bytes(raw),
            ByteOrder::Big => i16::from_be_bytes(raw),
        }
    }
}

/// Encoded verdict, ready to be written to the data block at byte 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
