//! Fixed on-disk layout of an event ring file.
//!
//! ```text
//! [ header: HEADER_SIZE ][ descriptors: 2^descriptors_shift * DESCRIPTOR_SIZE ][ payload: 2^payload_buf_shift ]
//! ```
//!
//! Header fields are little-endian: magic (8), version (u32), content type (u16),
//! descriptors shift (u8), payload shift (u8), schema hash (32).

use std::{fs::File, io, os::unix::fs::FileExt};

use alloy_primitives::B256;
use strata_executor::exec_event_schema_hash;

use crate::{RingConfig, RingError};

/// Magic bytes opening every ring file.
pub const RING_MAGIC: [u8; 8] = *b"STRATARG";

/// Current header version.
pub const RING_VERSION: u32 = 1;

/// Header region size; descriptors start on the following page.
pub const HEADER_SIZE: u64 = 4096;

/// Size of one event descriptor.
pub const DESCRIPTOR_SIZE: u64 = 64;

/// Content type tag for execution events.
pub const CONTENT_TYPE_EXEC: u16 = 1;

const DESCRIPTORS_SHIFT_RANGE: std::ops::RangeInclusive<u8> = 4..=32;
const PAYLOAD_BUF_SHIFT_RANGE: std::ops::RangeInclusive<u8> = 12..=40;
const ENCODED_LEN: usize = 48;

/// Region sizes and content identity of a ring file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingLayout {
    /// log2 of the descriptor count.
    pub descriptors_shift: u8,
    /// log2 of the payload buffer size in bytes.
    pub payload_buf_shift: u8,
    /// What kind of events the ring carries.
    pub content_type: u16,
    /// Hash of the event schema the writer produces.
    pub schema_hash: B256,
}

impl RingLayout {
    /// Build a layout, rejecting shifts outside the supported bounds.
    pub fn new(
        descriptors_shift: u8,
        payload_buf_shift: u8,
        content_type: u16,
        schema_hash: B256,
    ) -> Result<Self, RingError> {
        if !DESCRIPTORS_SHIFT_RANGE.contains(&descriptors_shift) {
            return Err(RingError::InvalidLayout(format!(
                "descriptors shift {descriptors_shift} outside {DESCRIPTORS_SHIFT_RANGE:?}"
            )));
        }
        if !PAYLOAD_BUF_SHIFT_RANGE.contains(&payload_buf_shift) {
            return Err(RingError::InvalidLayout(format!(
                "payload buffer shift {payload_buf_shift} outside {PAYLOAD_BUF_SHIFT_RANGE:?}"
            )));
        }
        Ok(Self { descriptors_shift, payload_buf_shift, content_type, schema_hash })
    }

    /// Layout of an execution event ring sized by `config`.
    pub fn exec(config: &RingConfig) -> Result<Self, RingError> {
        Self::new(
            config.descriptors_shift,
            config.payload_buf_shift,
            CONTENT_TYPE_EXEC,
            exec_event_schema_hash(),
        )
    }

    /// Number of descriptor slots.
    pub const fn descriptor_capacity(&self) -> u64 {
        1 << self.descriptors_shift
    }

    /// Payload buffer size in bytes.
    pub const fn payload_buf_size(&self) -> u64 {
        1 << self.payload_buf_shift
    }

    /// Offset of the payload buffer.
    pub const fn payload_offset(&self) -> u64 {
        HEADER_SIZE + self.descriptor_capacity() * DESCRIPTOR_SIZE
    }

    /// Total file size.
    pub const fn file_size(&self) -> u64 {
        self.payload_offset() + self.payload_buf_size()
    }

    /// Encode the header fields.
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        out[..8].copy_from_slice(&RING_MAGIC);
        out[8..12].copy_from_slice(&RING_VERSION.to_le_bytes());
        out[12..14].copy_from_slice(&self.content_type.to_le_bytes());
        out[14] = self.descriptors_shift;
        out[15] = self.payload_buf_shift;
        out[16..48].copy_from_slice(self.schema_hash.as_slice());
        out
    }

    /// Decode header fields, returning `None` unless they describe a complete,
    /// supported ring.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..ENCODED_LEN)?;
        if bytes[..8] != RING_MAGIC || bytes[8..12] != RING_VERSION.to_le_bytes() {
            return None;
        }
        let content_type = u16::from_le_bytes([bytes[12], bytes[13]]);
        Self::new(bytes[14], bytes[15], content_type, B256::from_slice(&bytes[16..48])).ok()
    }

    /// Size `file` and write the header.
    pub fn initialize(&self, file: &File) -> io::Result<()> {
        file.set_len(self.file_size())?;
        file.write_all_at(&self.encode(), 0)
    }

    /// Read the layout of an existing ring file, if it holds a valid header and is
    /// fully sized.
    pub fn read_from(file: &File) -> io::Result<Option<Self>> {
        let mut bytes = [0u8; ENCODED_LEN];
        if let Err(err) = file.read_exact_at(&mut bytes, 0) {
            return match err.kind() {
                io::ErrorKind::UnexpectedEof => Ok(None),
                _ => Err(err),
            };
        }
        let len = file.metadata()?.len();
        Ok(Self::decode(&bytes).filter(|layout| layout.file_size() == len))
    }
}
