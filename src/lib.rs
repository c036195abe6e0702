//! # segwal
//!
//! A single-writer, segmented write-ahead log with:
//! - Length-prefixed frames with position-aware CRC32 checksums
//! - Size-based segment rotation
//! - Crash recovery with torn-tail repair
//! - Checkpoint records bounding replay
//! - Optional background periodic fsync
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Wal (engine)                         │
//! │        write / write_checkpoint / sync / read / close        │
//! └───────┬──────────────────────┬─────────────────────┬────────┘
//!         │                      │                     │
//!         ▼                      ▼                     ▼
//!  ┌─────────────┐       ┌──────────────┐      ┌──────────────┐
//!  │ Frame Codec │       │ SegmentStore │      │  Recovery    │
//!  │ (len + CRC) │       │  (rotation)  │      │  (startup)   │
//!  └─────────────┘       └──────┬───────┘      └──────────────┘
//!                               │
//!                               ▼
//!                    segment-1 … segment-N
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use segwal::{Config, Wal};
//!
//! let wal = Wal::open(Config::builder().log_dir("./wal_data").build())?;
//! wal.write(b"a")?;
//! wal.write_checkpoint(b"snapshot")?;
//! wal.close()?;
//! # Ok::<(), segwal::WalError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FrameFault, Result, WalError};
pub use config::Config;
pub use engine::Wal;
pub use wal::{BincodeSerializer, LogRecord, RecordSerializer};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of segwal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
