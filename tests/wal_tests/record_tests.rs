//! Tests for WAL records and checksums
//!
//! These tests verify:
//! - Checksum is computed over payload and the sequence number's low byte
//! - Verification catches payload, sequence and checksum tampering
//! - Checkpoint construction

use segwal::wal::compute_checksum;
use segwal::LogRecord;

// =============================================================================
// Checksum Tests
// =============================================================================

#[test]
fn test_checksum_covers_payload_and_sequence_byte() {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(b"hello");
    hasher.update(&[7u8]);

    assert_eq!(compute_checksum(b"hello", 7), hasher.finalize());
}

#[test]
fn test_checksum_depends_on_position() {
    assert_ne!(compute_checksum(b"same", 1), compute_checksum(b"same", 2));
}

#[test]
fn test_checksum_uses_only_low_byte() {
    // 0x101 and 0x001 share a low byte
    assert_eq!(compute_checksum(b"x", 0x101), compute_checksum(b"x", 0x001));
}

#[test]
fn test_checksum_empty_payload() {
    let record = LogRecord::new(1, Vec::new());
    assert!(record.verify());
}

// =============================================================================
// Verification Tests
// =============================================================================

#[test]
fn test_new_record_verifies() {
    let record = LogRecord::new(42, b"payload".to_vec());

    assert_eq!(record.sequence_no, 42);
    assert!(!record.is_checkpoint);
    assert!(record.verify());
}

#[test]
fn test_tampered_payload_fails_verification() {
    let mut record = LogRecord::new(1, b"payload".to_vec());
    record.payload[0] ^= 0x01;

    assert!(!record.verify());
}

#[test]
fn test_moved_record_fails_verification() {
    let mut record = LogRecord::new(1, b"payload".to_vec());
    record.sequence_no = 2;

    assert!(!record.verify());
}

#[test]
fn test_tampered_checksum_fails_verification() {
    let mut record = LogRecord::new(1, b"payload".to_vec());
    record.checksum ^= 0xFFFF_FFFF;

    assert!(!record.verify());
}

// =============================================================================
// Checkpoint Tests
// =============================================================================

#[test]
fn test_checkpoint_record() {
    let record = LogRecord::checkpoint(3, b"c".to_vec());

    assert!(record.is_checkpoint);
    assert_eq!(record.checksum, compute_checksum(b"c", 3));
    assert!(record.verify());
}
