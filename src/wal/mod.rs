//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only, segmented logging.
//!
//! ## Responsibilities
//! - Frame records with a length prefix and verify CRC32 checksums on read
//! - Manage numbered segment files and size-based rotation
//! - Crash recovery: find the resume sequence number, cut torn tails
//!
//! ## Directory Layout
//! ```text
//! {log_dir}/
//!   ├── segment-1      (sealed)
//!   ├── segment-2      (sealed)
//!   └── segment-3      (active, appended to)
//! ```
//!
//! ## Segment Format
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ Frame 1                                             │
//! │ ┌─────────┬───────────────────────────────────────┐ │
//! │ │ Len (4) │ Record (Len bytes)                    │ │
//! │ └─────────┴───────────────────────────────────────┘ │
//! ├─────────────────────────────────────────────────────┤
//! │ Frame 2 ...                                         │
//! └─────────────────────────────────────────────────────┘
//!
//! Record (bincode by default):
//!   sequence_no: u64 | payload: bytes | checksum: u32 | is_checkpoint: bool
//! ```

mod record;
mod writer;
mod reader;
mod recovery;

pub mod codec;
pub mod segment;

pub use record::{compute_checksum, LogRecord};
pub use codec::{BincodeSerializer, RecordSerializer, LENGTH_PREFIX_SIZE};
pub use segment::SegmentStore;
pub use writer::SegmentWriter;
pub use reader::{RecordIterator, SegmentReader, TailPolicy};
pub use recovery::{RecoveryResult, VerifyReport, WalRecovery};
