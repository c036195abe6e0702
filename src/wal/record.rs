//! WAL record definitions
//!
//! Defines the logical unit that callers write and read back.

use serde::{Deserialize, Serialize};

/// A single record in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Sequence number - assigned by the engine, strictly increasing from 1
    pub sequence_no: u64,

    /// Caller-supplied opaque data
    pub payload: Vec<u8>,

    /// CRC32 over `payload` followed by the low byte of `sequence_no`
    pub checksum: u32,

    /// Marks a durable safe-replay point
    #[serde(default)]
    pub is_checkpoint: bool,
}

impl LogRecord {
    /// Build a record, computing its checksum
    pub fn new(sequence_no: u64, payload: Vec<u8>) -> Self {
        let checksum = compute_checksum(&payload, sequence_no);
        Self {
            sequence_no,
            payload,
            checksum,
            is_checkpoint: false,
        }
    }

    /// Build a checkpoint record, computing its checksum
    pub fn checkpoint(sequence_no: u64, payload: Vec<u8>) -> Self {
        let mut record = Self::new(sequence_no, payload);
        record.is_checkpoint = true;
        record
    }

    /// Recompute the checksum from `(payload, sequence_no)` and compare
    pub fn verify(&self) -> bool {
        self.checksum == compute_checksum(&self.payload, self.sequence_no)
    }
}

/// CRC32 (IEEE) over `payload ++ [sequence_no as u8]`
///
/// Mixing in the sequence byte ties a record to its position, so a frame
/// copied or moved elsewhere in the log fails verification.
pub fn compute_checksum(payload: &[u8], sequence_no: u64) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.update(&[sequence_no as u8]);
    hasher.finalize()
}
