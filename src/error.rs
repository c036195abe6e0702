//! Error types for segwal
//!
//! Provides a unified error type for all operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using WalError
pub type Result<T> = std::result::Result<T, WalError>;

/// Unified error type for WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAL segment is locked by another writer: {}", .0.display())]
    Locked(PathBuf),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("WAL is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Integrity Errors
    // -------------------------------------------------------------------------
    #[error("corrupt frame at offset {offset}: {fault}")]
    FrameCorrupt { offset: u64, fault: FrameFault },

    #[error("checksum mismatch for record {sequence_no} at offset {offset}")]
    ChecksumMismatch { sequence_no: u64, offset: u64 },

    #[error("corrupt log in segment {segment_no}: {reason}")]
    CorruptLog { segment_no: u32, reason: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalError {
    /// True when the error describes a frame cut short by end-of-file.
    ///
    /// At the tail of the active segment this means "not yet written"
    /// (or a crash mid-append), not corruption.
    pub fn is_torn_tail(&self) -> bool {
        matches!(
            self,
            WalError::FrameCorrupt {
                fault: FrameFault::TruncatedLength | FrameFault::TruncatedBody { .. },
                ..
            }
        )
    }

    /// True for any data-integrity failure detected while decoding.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            WalError::FrameCorrupt { .. }
                | WalError::ChecksumMismatch { .. }
                | WalError::CorruptLog { .. }
        )
    }
}

/// Why a frame failed to decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameFault {
    /// Fewer than 4 bytes remained where a length prefix was expected
    TruncatedLength,

    /// The length prefix promised more bytes than the file holds
    TruncatedBody { expected: u32, actual: u32 },

    /// The record bytes were complete but could not be deserialized
    Malformed(String),
}

impl fmt::Display for FrameFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameFault::TruncatedLength => write!(f, "truncated length prefix"),
            FrameFault::TruncatedBody { expected, actual } => {
                write!(f, "truncated body: expected {} bytes, got {}", expected, actual)
            }
            FrameFault::Malformed(msg) => write!(f, "malformed record: {}", msg),
        }
    }
}
