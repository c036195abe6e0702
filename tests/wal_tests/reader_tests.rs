//! Tests for the segment reader
//!
//! These tests verify:
//! - Reading records from a segment file
//! - Iterator functionality
//! - Torn tail handling under each tail policy
//! - Empty file handling

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use segwal::wal::codec::encode_frame;
use segwal::wal::{SegmentReader, TailPolicy};
use segwal::{BincodeSerializer, LogRecord, RecordSerializer, WalError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_segment() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("segment-1");
    (temp_dir, path)
}

fn serializer() -> Arc<dyn RecordSerializer> {
    Arc::new(BincodeSerializer)
}

fn frames(records: &[LogRecord]) -> Vec<u8> {
    records
        .iter()
        .flat_map(|r| encode_frame(&BincodeSerializer, r).unwrap())
        .collect()
}

fn write_segment(path: &PathBuf, bytes: &[u8]) {
    let mut file = File::create(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

fn sample_records(count: u64) -> Vec<LogRecord> {
    (1..=count)
        .map(|seq| LogRecord::new(seq, format!("record-{}", seq).into_bytes()))
        .collect()
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, path) = setup_temp_segment();
    File::create(&path).unwrap();

    let mut reader = SegmentReader::open(&path, serializer()).unwrap();

    assert!(reader.next_record().unwrap().is_none());
    assert_eq!(reader.offset(), 0);
}

#[test]
fn test_read_missing_file() {
    let (_temp, path) = setup_temp_segment();

    let result = SegmentReader::open(&path, serializer());
    assert!(matches!(result, Err(WalError::Io(_))));
}

#[test]
fn test_read_records_in_order() {
    let (_temp, path) = setup_temp_segment();
    let records = sample_records(5);
    write_segment(&path, &frames(&records));

    let mut reader = SegmentReader::open(&path, serializer()).unwrap();
    let read = reader.read_all(TailPolicy::Strict).unwrap();

    assert_eq!(read, records);
}

#[test]
fn test_offset_advances_per_frame() {
    let (_temp, path) = setup_temp_segment();
    let records = sample_records(2);
    let first_len = encode_frame(&BincodeSerializer, &records[0]).unwrap().len() as u64;
    let bytes = frames(&records);
    write_segment(&path, &bytes);

    let mut reader = SegmentReader::open(&path, serializer()).unwrap();
    reader.next_record().unwrap();
    assert_eq!(reader.offset(), first_len);

    reader.next_record().unwrap();
    assert_eq!(reader.offset(), bytes.len() as u64);
    assert_eq!(reader.path(), path.as_path());
}

#[test]
fn test_iterator() {
    let (_temp, path) = setup_temp_segment();
    let records = sample_records(3);
    write_segment(&path, &frames(&records));

    let reader = SegmentReader::open(&path, serializer()).unwrap();
    let sequence_nos: Vec<u64> = reader
        .records()
        .map(|r| r.unwrap().sequence_no)
        .collect();

    assert_eq!(sequence_nos, vec![1, 2, 3]);
}

#[test]
fn test_iterator_stops_after_error() {
    let (_temp, path) = setup_temp_segment();
    let mut bytes = frames(&sample_records(1));
    bytes.extend_from_slice(&[0xFF, 0xFF]);
    write_segment(&path, &bytes);

    let mut iter = SegmentReader::open(&path, serializer()).unwrap().records();

    assert!(iter.next().unwrap().is_ok());
    assert!(iter.next().unwrap().is_err());
    assert!(iter.next().is_none());
}

// =============================================================================
// Torn Tail Tests
// =============================================================================

#[test]
fn test_torn_tail_tolerated() {
    let (_temp, path) = setup_temp_segment();
    let records = sample_records(3);
    let mut bytes = frames(&records);
    let valid_len = bytes.len() as u64;
    // Half of a fourth frame
    let partial = encode_frame(&BincodeSerializer, &LogRecord::new(4, b"partial".to_vec())).unwrap();
    bytes.extend_from_slice(&partial[..partial.len() / 2]);
    write_segment(&path, &bytes);

    let mut reader = SegmentReader::open(&path, serializer()).unwrap();
    let read = reader.read_all(TailPolicy::TolerateTorn).unwrap();

    assert_eq!(read, records);
    assert_eq!(reader.offset(), valid_len);
}

#[test]
fn test_torn_tail_rejected_when_strict() {
    let (_temp, path) = setup_temp_segment();
    let mut bytes = frames(&sample_records(2));
    bytes.extend_from_slice(&[0x01]);
    write_segment(&path, &bytes);

    let mut reader = SegmentReader::open(&path, serializer()).unwrap();
    let err = reader.read_all(TailPolicy::Strict).unwrap_err();

    assert!(err.is_torn_tail());
}

#[test]
fn test_checksum_mismatch_never_tolerated() {
    let (_temp, path) = setup_temp_segment();
    let mut bytes = frames(&sample_records(3));
    // Flip a payload bit in the first frame: len(4) + seq(8) + payload_len(8)
    bytes[20] ^= 0x80;
    write_segment(&path, &bytes);

    let mut reader = SegmentReader::open(&path, serializer()).unwrap();
    let err = reader.read_all(TailPolicy::TolerateTorn).unwrap_err();

    assert!(matches!(err, WalError::ChecksumMismatch { sequence_no: 1, offset: 0 }));
}
