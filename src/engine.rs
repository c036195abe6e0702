//! Engine Module
//!
//! The WAL engine that coordinates segments, recovery and syncing.
//!
//! ## Responsibilities
//! - Recover the resume point on open and repair a torn tail
//! - Assign sequence numbers, checksum, frame and buffer each write
//! - Rotate segments when the size cap would be exceeded
//! - Periodically sync in the background when enabled
//! - Serve full and checkpoint-bounded replays

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, WalError};
use crate::wal::codec::encode_frame;
use crate::wal::segment::should_rotate;
use crate::wal::{
    BincodeSerializer, LogRecord, RecordSerializer, SegmentReader, SegmentStore, SegmentWriter,
    TailPolicy, WalRecovery,
};

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Open,
    Closing,
    Closed,
}

/// Everything write/rotate/sync touch, guarded by one lock
struct WalState {
    lifecycle: Lifecycle,
    /// Active segment; `None` once closed
    writer: Option<SegmentWriter>,
    last_sequence_no: u64,
}

/// State shared with the background syncer
struct WalShared {
    config: Config,
    store: SegmentStore,
    serializer: Arc<dyn RecordSerializer>,
    state: Mutex<WalState>,
}

/// Handle on the background periodic-sync thread
struct BackgroundSyncer {
    /// Dropping this is the stop signal
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// The write-ahead log
///
/// ## Concurrency Model: Single Writer, Independent Readers
///
/// - **Writes** (write/write_checkpoint/sync/rotation): serialized by one
///   mutex held for the full critical section, shared with the background
///   syncer
/// - **Reads** (read_all/read_from_checkpoint): open their own file handles
///   and take no lock; a frame still being appended looks like a torn tail
///   and ends the read
pub struct Wal {
    shared: Arc<WalShared>,
    syncer: Mutex<Option<BackgroundSyncer>>,
}

impl Wal {
    /// Open or create a WAL with the default bincode serializer
    ///
    /// On startup:
    /// 1. Normalize config against defaults
    /// 2. Create the log directory if missing
    /// 3. Open the newest segment (or create segment 1) and lock it
    /// 4. Recover the last sequence number, cutting any torn tail
    /// 5. Start the background syncer if enabled
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_serializer(config, Arc::new(BincodeSerializer))
    }

    /// Open or create a WAL with a caller-supplied record serializer
    pub fn open_with_serializer(
        config: Config,
        serializer: Arc<dyn RecordSerializer>,
    ) -> Result<Self> {
        let config = config.normalized();

        let store = SegmentStore::open(&config.log_dir)?;
        let (file, segment_no) = store.discover_or_create()?;
        let mut writer = SegmentWriter::new(
            file,
            store.segment_path(segment_no),
            segment_no,
            config.buffer_size,
        )?;

        let recovery = WalRecovery::recover(&store, segment_no, &serializer)?;
        if recovery.was_truncated {
            tracing::warn!(
                "Discarding torn tail of segment {}: {} bytes after offset {}",
                segment_no,
                recovery.file_len - recovery.valid_len,
                recovery.valid_len
            );
            writer.truncate(recovery.valid_len)?;
        }

        tracing::info!(
            "Opened WAL at {} (segment {}, last_sequence_no={})",
            store.dir().display(),
            segment_no,
            recovery.last_sequence_no
        );

        let shared = Arc::new(WalShared {
            config,
            store,
            serializer,
            state: Mutex::new(WalState {
                lifecycle: Lifecycle::Open,
                writer: Some(writer),
                last_sequence_no: recovery.last_sequence_no,
            }),
        });

        let syncer = if shared.config.sync_enabled {
            Some(BackgroundSyncer::spawn(
                Arc::clone(&shared),
                shared.config.sync_interval,
            )?)
        } else {
            None
        };

        Ok(Self {
            shared,
            syncer: Mutex::new(syncer),
        })
    }

    /// Append a record (buffered; durable after the next sync)
    ///
    /// Returns the sequence number assigned to the record.
    pub fn write(&self, payload: &[u8]) -> Result<u64> {
        self.shared.append(payload, false)
    }

    /// Append a checkpoint record and make it durable before returning
    pub fn write_checkpoint(&self, payload: &[u8]) -> Result<u64> {
        self.shared.append(payload, true)
    }

    /// Flush buffered records and fsync the active segment
    ///
    /// Safe to call with nothing pending.
    pub fn sync(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.lifecycle != Lifecycle::Open {
            return Err(WalError::Closed);
        }
        match state.writer.as_mut() {
            Some(writer) => writer.sync(),
            None => Err(WalError::Closed),
        }
    }

    /// Read every record in the log, oldest first
    ///
    /// Scans all segments in order. A checksum mismatch anywhere aborts the
    /// read. Records still in the write buffer are not visible.
    pub fn read_all(&self) -> Result<Vec<LogRecord>> {
        let segments = self.shared.store.segment_numbers()?;
        let newest = segments.last().copied();

        let mut records = Vec::new();
        for segment_no in segments {
            records.extend(self.scan_segment(segment_no, Some(segment_no) == newest)?);
        }

        Ok(records)
    }

    /// Read from the most recent checkpoint (inclusive) to the end of the log
    ///
    /// Behaves like `read_all` when no checkpoint exists.
    pub fn read_from_checkpoint(&self) -> Result<Vec<LogRecord>> {
        let mut records = Vec::new();

        for record in self.read_all()? {
            if record.is_checkpoint {
                records.clear();
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Read the records of a single segment
    pub fn read_segment(&self, segment_no: u32) -> Result<Vec<LogRecord>> {
        let newest = self.shared.store.segment_numbers()?.last().copied();
        self.scan_segment(segment_no, Some(segment_no) == newest)
    }

    /// Stop the background syncer, sync, and release the active segment
    ///
    /// After this, writes and syncs fail with `Closed`; reads still work.
    /// Calling it again is a no-op.
    pub fn close(&self) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            if state.lifecycle != Lifecycle::Open {
                return Ok(());
            }
            state.lifecycle = Lifecycle::Closing;
        }

        // Join before the final sync so that sync is the last one
        if let Some(syncer) = self.syncer.lock().take() {
            syncer.stop();
        }

        let mut state = self.shared.state.lock();
        let result = match state.writer.take() {
            Some(writer) => writer.close(),
            None => Ok(()),
        };
        state.lifecycle = Lifecycle::Closed;

        tracing::info!(
            "Closed WAL at {} (last_sequence_no={})",
            self.shared.store.dir().display(),
            state.last_sequence_no
        );

        result
    }

    /// Get the last assigned sequence number (0 for an empty log)
    pub fn last_sequence_no(&self) -> u64 {
        self.shared.state.lock().last_sequence_no
    }

    /// Get the active segment number, or `None` once closed
    pub fn current_segment_no(&self) -> Option<u32> {
        self.shared
            .state
            .lock()
            .writer
            .as_ref()
            .map(SegmentWriter::segment_no)
    }

    /// List all segment numbers on disk in ascending order
    pub fn segment_numbers(&self) -> Result<Vec<u32>> {
        self.shared.store.segment_numbers()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().lifecycle != Lifecycle::Open
    }

    /// Get the normalized configuration
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    fn scan_segment(&self, segment_no: u32, is_newest: bool) -> Result<Vec<LogRecord>> {
        let path = self.shared.store.segment_path(segment_no);
        let mut reader = SegmentReader::open(&path, Arc::clone(&self.shared.serializer))?;

        let tail = if is_newest {
            TailPolicy::TolerateTorn
        } else {
            TailPolicy::Strict
        };
        reader.read_all(tail)
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Error closing WAL on drop: {}", e);
        }
    }
}

impl WalShared {
    /// Write path shared by plain and checkpoint records
    fn append(&self, payload: &[u8], checkpoint: bool) -> Result<u64> {
        let mut state = self.state.lock();
        if state.lifecycle != Lifecycle::Open {
            return Err(WalError::Closed);
        }

        let sequence_no = state.last_sequence_no + 1;
        let record = if checkpoint {
            LogRecord::checkpoint(sequence_no, payload.to_vec())
        } else {
            LogRecord::new(sequence_no, payload.to_vec())
        };
        let frame = encode_frame(self.serializer.as_ref(), &record)?;

        let writer = state.writer.as_mut().ok_or(WalError::Closed)?;
        if should_rotate(writer.size(), frame.len() as u64, self.config.max_segment_size) {
            let next = self.store.rotate(writer, self.config.buffer_size)?;
            *writer = next;
        }

        writer.append(&frame)?;
        state.last_sequence_no = sequence_no;

        if checkpoint {
            // Record is already buffered under its sequence number; only its
            // durability is in question if this fails
            if let Some(writer) = state.writer.as_mut() {
                writer.sync()?;
            }
        }

        tracing::trace!(
            "Appended record {} ({} bytes, checkpoint={})",
            sequence_no,
            frame.len(),
            checkpoint
        );

        Ok(sequence_no)
    }

    /// Periodic sync; a no-op once the engine is closing
    fn background_sync(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.lifecycle != Lifecycle::Open {
            return Ok(());
        }
        match state.writer.as_mut() {
            Some(writer) => writer.sync(),
            None => Ok(()),
        }
    }
}

impl BackgroundSyncer {
    fn spawn(shared: Arc<WalShared>, interval: Duration) -> Result<Self> {
        let (shutdown, shutdown_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("segwal-sync".to_string())
            .spawn(move || Self::run(shared, interval, shutdown_rx))?;

        tracing::debug!("Started background sync every {:?}", interval);

        Ok(Self { shutdown, handle })
    }

    fn run(shared: Arc<WalShared>, interval: Duration, shutdown_rx: Receiver<()>) {
        let ticker = channel::tick(interval);

        loop {
            crossbeam::select! {
                recv(shutdown_rx) -> _ => break,
                recv(ticker) -> _ => {
                    // Both may be ready at once; stop wins
                    if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
                        break;
                    }
                    if let Err(e) = shared.background_sync() {
                        tracing::warn!("Background WAL sync failed: {}", e);
                    }
                }
            }
        }

        tracing::debug!("Background sync stopped");
    }

    /// Signal the thread and wait for it to exit
    fn stop(self) {
        drop(self.shutdown);
        if self.handle.join().is_err() {
            tracing::warn!("Background sync thread panicked");
        }
    }
}
