//! Segment store
//!
//! Owns the mapping from a log directory to its ordered segment files.
//!
//! ## Responsibilities
//! - Name and parse segment files (`segment-<N>`, N starting at 1)
//! - Discover the newest segment on startup, or create the first one
//! - Decide when the active segment must rotate
//! - Seal the active segment and open its successor

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Result, WalError};
use super::SegmentWriter;

/// File name prefix shared by every segment
pub const SEGMENT_PREFIX: &str = "segment-";

/// Number given to the first segment of a fresh log
pub const FIRST_SEGMENT_NO: u32 = 1;

/// Manages the segment files of one log directory
#[derive(Debug, Clone)]
pub struct SegmentStore {
    /// Directory holding every segment
    dir: PathBuf,
}

impl SegmentStore {
    /// Bind to a directory without touching the filesystem
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Bind to a directory, creating it if it doesn't exist
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(dir);
        fs::create_dir_all(&store.dir)?;
        Ok(store)
    }

    /// Get the log directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generate the file path for a segment number
    pub fn segment_path(&self, segment_no: u32) -> PathBuf {
        self.dir.join(format!("{}{}", SEGMENT_PREFIX, segment_no))
    }

    /// List segment numbers in ascending order
    ///
    /// Every entry in the directory must be a segment file; anything else is a
    /// configuration error since the directory belongs to this log alone.
    pub fn segment_numbers(&self) -> Result<Vec<u32>> {
        let mut numbers = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            numbers.push(parse_segment_no(&entry.path())?);
        }

        // Numeric order, not lexical: segment-10 comes after segment-9
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Open the newest segment for appending, or create segment 1
    ///
    /// The returned handle is positioned at end-of-file.
    pub fn discover_or_create(&self) -> Result<(File, u32)> {
        let numbers = self.segment_numbers()?;

        let Some(&newest) = numbers.last() else {
            let file = self.create(FIRST_SEGMENT_NO)?;
            tracing::debug!("Created first segment in {}", self.dir.display());
            return Ok((file, FIRST_SEGMENT_NO));
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(self.segment_path(newest))?;
        file.seek(SeekFrom::End(0))?;

        Ok((file, newest))
    }

    /// Create a new, empty segment file
    ///
    /// Fails if the segment already exists: segment numbers are never reused.
    pub fn create(&self, segment_no: u32) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create_new(true)
            .open(self.segment_path(segment_no))?;
        Ok(file)
    }

    /// Seal the active segment and open the next one
    ///
    /// The active segment is flushed and fsynced first, so nothing buffered is
    /// lost across the boundary. The sealed file is left untouched.
    pub fn rotate(&self, active: &mut SegmentWriter, buffer_size: usize) -> Result<SegmentWriter> {
        active.sync()?;

        let next_no = active.segment_no().checked_add(1).ok_or_else(|| {
            WalError::Config(format!(
                "segment number overflow after segment {}",
                active.segment_no()
            ))
        })?;
        let file = self.create(next_no)?;

        tracing::info!(
            "Rotated WAL: sealed segment {} at {} bytes, opened segment {}",
            active.segment_no(),
            active.size(),
            next_no
        );

        SegmentWriter::new(file, self.segment_path(next_no), next_no, buffer_size)
    }
}

/// Whether appending `incoming` bytes would push the segment past `max_segment_size`
///
/// An empty segment never rotates, so an oversized frame gets a segment of its
/// own instead of producing an endless run of empty ones.
pub fn should_rotate(current_size: u64, incoming: u64, max_segment_size: u64) -> bool {
    current_size > 0 && current_size.saturating_add(incoming) > max_segment_size
}

/// Parse segment number from filename
/// "segment-42" → 42
pub fn parse_segment_no(path: &Path) -> Result<u32> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| WalError::Config(format!("invalid segment file name: {}", path.display())))?;

    let digits = name.strip_prefix(SEGMENT_PREFIX).ok_or_else(|| {
        WalError::Config(format!("unexpected file in log directory: {}", name))
    })?;

    // Reject signs, whitespace and the like: only plain decimal digits
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalError::Config(format!("malformed segment number in {}", name)));
    }

    match digits.parse::<u32>() {
        Ok(0) | Err(_) => Err(WalError::Config(format!(
            "segment number out of range in {}",
            name
        ))),
        Ok(n) => Ok(n),
    }
}
