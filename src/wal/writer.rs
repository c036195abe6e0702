//! WAL Writer
//!
//! Handles appending frames to the active segment file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Result, WalError};

/// Buffered append handle over the active segment
///
/// Holds an exclusive advisory lock on the file for as long as it lives.
pub struct SegmentWriter {
    /// Segment number of the file being written
    segment_no: u32,
    /// Path to the segment file
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Bytes appended so far, including those still buffered
    size: u64,
}

impl SegmentWriter {
    /// Wrap an append-mode segment file
    ///
    /// Fails with `Locked` if another writer already holds the segment.
    pub fn new(file: File, path: PathBuf, segment_no: u32, buffer_size: usize) -> Result<Self> {
        file.try_lock_exclusive()
            .map_err(|_| WalError::Locked(path.clone()))?;

        let size = file.metadata()?.len();

        Ok(Self {
            segment_no,
            path,
            writer: BufWriter::with_capacity(buffer_size, file),
            size,
        })
    }

    /// Append an encoded frame (buffered, not yet durable)
    pub fn append(&mut self, frame: &[u8]) -> Result<()> {
        self.writer.write_all(frame)?;
        self.size += frame.len() as u64;
        Ok(())
    }

    /// Flush the buffer and fsync the file
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Cut the file back to `len` bytes, discarding anything after it
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_ref();
        file.set_len(len)?;
        file.sync_all()?;
        self.size = len;
        Ok(())
    }

    /// Final sync, then release the lock and the file handle
    pub fn close(mut self) -> Result<()> {
        self.sync()?;
        let file = self.writer.into_inner().map_err(|e| WalError::Io(e.into_error()))?;
        // Dropping the handle releases the lock too; unlocking first keeps it explicit
        let _ = FileExt::unlock(&file);
        Ok(())
    }

    /// Get the segment number
    pub fn segment_no(&self) -> u32 {
        self.segment_no
    }

    /// Get the segment path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the segment size in bytes, counting buffered data
    pub fn size(&self) -> u64 {
        self.size
    }
}
