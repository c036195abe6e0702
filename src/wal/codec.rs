//! Frame codec
//!
//! Converts records to length-prefixed frames and back.
//!
//! ## Frame Format
//! ```text
//! ┌──────────────┬──────────────────────────────────┐
//! │ Len (4, LE)  │   Serialized LogRecord (Len)     │
//! └──────────────┴──────────────────────────────────┘
//! ```
//!
//! The record bytes are produced by a [`RecordSerializer`]; the codec only
//! treats them as an opaque blob. Every decoded record has its checksum
//! recomputed before it is returned.

use std::io::{self, Read};

use bytes::{BufMut, BytesMut};

use crate::error::{FrameFault, Result, WalError};
use super::LogRecord;

/// Length prefix size in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

// =============================================================================
// Serializer Contract
// =============================================================================

/// Turns records into bytes and back
///
/// Implementations must be deterministic: the same record always yields the
/// same bytes.
pub trait RecordSerializer: Send + Sync {
    fn serialize(&self, record: &LogRecord) -> Result<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> Result<LogRecord>;
}

/// Default serializer backed by bincode
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

impl RecordSerializer for BincodeSerializer {
    fn serialize(&self, record: &LogRecord) -> Result<Vec<u8>> {
        bincode::serialize(record).map_err(|e| WalError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<LogRecord> {
        bincode::deserialize(bytes).map_err(|e| WalError::Serialization(e.to_string()))
    }
}

// =============================================================================
// Frame Encoding/Decoding
// =============================================================================

/// Encode a record into a frame
///
/// Format: record_len (4, little-endian) + record bytes
pub fn encode_frame(serializer: &dyn RecordSerializer, record: &LogRecord) -> Result<Vec<u8>> {
    let body = serializer.serialize(record)?;
    let len = u32::try_from(body.len()).map_err(|_| {
        WalError::Serialization(format!(
            "record {} too large for a frame: {} bytes",
            record.sequence_no,
            body.len()
        ))
    })?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
    frame.put_u32_le(len);
    frame.put_slice(&body);

    Ok(frame.to_vec())
}

/// Decode the next frame from a reader
///
/// `offset` is the position of the frame in its file and is only used to
/// label errors.
///
/// Returns:
/// - `Ok(Some(record))`: a complete, checksum-verified record
/// - `Ok(None)`: clean end of stream (no bytes left)
/// - `Err(FrameCorrupt)`: truncated length, truncated body, or undecodable bytes
/// - `Err(ChecksumMismatch)`: the record decoded but failed verification
pub fn decode_frame<R: Read>(
    reader: &mut R,
    serializer: &dyn RecordSerializer,
    offset: u64,
) -> Result<Option<LogRecord>> {
    // Read length prefix, distinguishing clean EOF from a partial prefix
    let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
    let got = read_up_to(reader, &mut len_buf)?;
    if got == 0 {
        return Ok(None);
    }
    if got < LENGTH_PREFIX_SIZE {
        return Err(WalError::FrameCorrupt {
            offset,
            fault: FrameFault::TruncatedLength,
        });
    }
    let len = u32::from_le_bytes(len_buf);

    // Bounded read: a garbage length never allocates more than the file holds
    let mut body = Vec::new();
    reader.by_ref().take(u64::from(len)).read_to_end(&mut body)?;
    if body.len() < len as usize {
        return Err(WalError::FrameCorrupt {
            offset,
            fault: FrameFault::TruncatedBody {
                expected: len,
                actual: body.len() as u32,
            },
        });
    }

    let record = serializer.deserialize(&body).map_err(|e| WalError::FrameCorrupt {
        offset,
        fault: FrameFault::Malformed(e.to_string()),
    })?;

    if !record.verify() {
        return Err(WalError::ChecksumMismatch {
            sequence_no: record.sequence_no,
            offset,
        });
    }

    Ok(Some(record))
}

/// Size on disk of a frame carrying `body_len` record bytes
pub fn frame_size(body_len: usize) -> u64 {
    (LENGTH_PREFIX_SIZE + body_len) as u64
}

/// Fill as much of `buf` as the reader allows, returning the byte count
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
