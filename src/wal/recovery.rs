//! WAL Recovery
//!
//! Replays segments at startup to find the last assigned sequence number.
//!
//! A truncated final frame (crash mid-append) is expected and is cut away.
//! Anything else that fails to decode, or a checksum mismatch, means the log
//! cannot be trusted and recovery fails.

use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, WalError};
use super::codec::RecordSerializer;
use super::reader::SegmentReader;
use super::segment::SegmentStore;

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of scanning one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Segment that was scanned
    pub segment_no: u32,

    /// Number of complete, verified records
    pub records_recovered: u64,

    /// Highest sequence number seen (0 when the segment is empty)
    pub last_sequence_no: u64,

    /// Byte length of the valid prefix of the segment
    pub valid_len: u64,

    /// Byte length of the file when scanned
    pub file_len: u64,

    /// Whether a torn trailing frame was found past `valid_len`
    pub was_truncated: bool,
}

/// Summary of a whole log directory, produced without modifying it
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Per-segment results in ascending segment order
    pub segments: Vec<RecoveryResult>,

    /// Total verified records across all segments
    pub total_records: u64,

    /// Highest sequence number in the log
    pub last_sequence_no: u64,
}

impl WalRecovery {
    /// Recover the resume point of a log whose newest segment is `active`
    ///
    /// Scans the active segment; if it holds no records (e.g. a crash right
    /// after rotation), walks back through sealed segments until one does.
    /// The returned result always describes the active segment, with
    /// `last_sequence_no` carried over from wherever it was found.
    pub fn recover(
        store: &SegmentStore,
        active: u32,
        serializer: &Arc<dyn RecordSerializer>,
    ) -> Result<RecoveryResult> {
        let mut result = Self::scan_segment(store, active, serializer, true)?;

        if result.records_recovered == 0 {
            let sealed: Vec<u32> = store
                .segment_numbers()?
                .into_iter()
                .filter(|&n| n < active)
                .collect();

            for &segment_no in sealed.iter().rev() {
                let earlier = Self::scan_segment(store, segment_no, serializer, false)?;
                if earlier.records_recovered > 0 {
                    result.last_sequence_no = earlier.last_sequence_no;
                    break;
                }
            }
        }

        tracing::debug!(
            "Recovered segment {}: {} records, last_sequence_no={}, truncated={}",
            result.segment_no,
            result.records_recovered,
            result.last_sequence_no,
            result.was_truncated
        );

        Ok(result)
    }

    /// Scan one segment without modifying it
    ///
    /// `allow_torn_tail` is true only for the active segment; sealed segments
    /// were fsynced before rotation and must end on a frame boundary.
    pub fn scan_segment(
        store: &SegmentStore,
        segment_no: u32,
        serializer: &Arc<dyn RecordSerializer>,
        allow_torn_tail: bool,
    ) -> Result<RecoveryResult> {
        let path = store.segment_path(segment_no);
        let file_len = std::fs::metadata(&path)?.len();

        let mut reader = SegmentReader::open(&path, Arc::clone(serializer))?;
        let mut records_recovered = 0u64;
        let mut last_sequence_no = 0u64;
        let mut was_truncated = false;

        loop {
            match reader.next_record() {
                Ok(Some(record)) => {
                    if record.sequence_no <= last_sequence_no {
                        return Err(WalError::CorruptLog {
                            segment_no,
                            reason: format!(
                                "sequence number {} does not follow {} at offset {}",
                                record.sequence_no,
                                last_sequence_no,
                                reader.offset()
                            ),
                        });
                    }
                    last_sequence_no = record.sequence_no;
                    records_recovered += 1;
                }
                Ok(None) => break,
                Err(e) if allow_torn_tail && e.is_torn_tail() => {
                    was_truncated = true;
                    break;
                }
                Err(e) if e.is_corruption() => {
                    return Err(WalError::CorruptLog {
                        segment_no,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(RecoveryResult {
            segment_no,
            records_recovered,
            last_sequence_no,
            valid_len: reader.offset(),
            file_len,
            was_truncated,
        })
    }

    /// Verify integrity of a whole log directory without modifying it
    pub fn verify(dir: &Path, serializer: &Arc<dyn RecordSerializer>) -> Result<VerifyReport> {
        let store = SegmentStore::new(dir);
        let numbers = store.segment_numbers()?;
        let newest = numbers.last().copied();

        let mut report = VerifyReport::default();
        for segment_no in numbers {
            let result =
                Self::scan_segment(&store, segment_no, serializer, Some(segment_no) == newest)?;

            if result.records_recovered > 0 {
                if result.last_sequence_no <= report.last_sequence_no {
                    return Err(WalError::CorruptLog {
                        segment_no,
                        reason: format!(
                            "sequence numbers restart at segment boundary (previous max {})",
                            report.last_sequence_no
                        ),
                    });
                }
                report.last_sequence_no = result.last_sequence_no;
            }
            report.total_records += result.records_recovered;
            report.segments.push(result);
        }

        Ok(report)
    }
}
