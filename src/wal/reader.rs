//! WAL Reader
//!
//! Handles reading records from one segment file, independently of the
//! writer's handle.

use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use super::codec::{decode_frame, RecordSerializer};
use super::LogRecord;

/// How a scan treats a frame cut short by end-of-file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailPolicy {
    /// A torn tail is an error (sealed segments always end cleanly)
    Strict,

    /// A torn tail ends the scan: the frame is still being written or was
    /// interrupted by a crash
    TolerateTorn,
}

/// Reads records from a segment file
pub struct SegmentReader {
    /// Path of the segment being read
    path: PathBuf,
    /// Buffered reader for efficient sequential reads
    reader: BufReader<File>,
    /// Byte offset just past the last complete frame
    offset: u64,
    /// Decodes record bytes
    serializer: Arc<dyn RecordSerializer>,
}

impl SegmentReader {
    /// Open a segment file for reading
    pub fn open(path: &Path, serializer: Arc<dyn RecordSerializer>) -> Result<Self> {
        let file = File::open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            offset: 0,
            serializer,
        })
    }

    /// Read the next record from the segment
    ///
    /// Returns `Ok(None)` at clean end of file.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>> {
        let record = decode_frame(&mut self.reader, self.serializer.as_ref(), self.offset)?;
        if record.is_some() {
            self.offset = self.reader.stream_position()?;
        }
        Ok(record)
    }

    /// Read every record to the end of the segment
    ///
    /// Any checksum or decode failure aborts the scan; no partial result is
    /// returned. Under `TolerateTorn` a truncated final frame ends the scan
    /// instead.
    pub fn read_all(&mut self, tail: TailPolicy) -> Result<Vec<LogRecord>> {
        let mut records = Vec::new();

        loop {
            match self.next_record() {
                Ok(Some(record)) => records.push(record),
                Ok(None) => break,
                Err(e) if tail == TailPolicy::TolerateTorn && e.is_torn_tail() => {
                    tracing::trace!(
                        "Stopping read of {} at torn frame (offset {})",
                        self.path.display(),
                        self.offset
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }

    /// Byte offset just past the last complete frame read so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Path of the segment being read
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate over all records, stopping after the first error
    pub fn records(self) -> RecordIterator {
        RecordIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over segment records
pub struct RecordIterator {
    reader: SegmentReader,
    done: bool,
}

impl Iterator for RecordIterator {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
