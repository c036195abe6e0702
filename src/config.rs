//! Configuration for segwal
//!
//! Centralized configuration with documented defaults. Any option left empty
//! or zero falls back to its default when the log is opened.

use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Defaults
// =============================================================================

/// Default root directory for segment files
pub const DEFAULT_LOG_DIR: &str = "./wal_data";

/// Default segment size cap before rotation (16 MB)
pub const DEFAULT_MAX_SEGMENT_SIZE: u64 = 16 * 1024 * 1024;

/// Background sync is off unless explicitly enabled
pub const DEFAULT_SYNC_ENABLED: bool = false;

/// Default period between background syncs when enabled
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5);

/// Default capacity of the in-memory write buffer (64 KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for a WAL instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all segment files
    /// Internal structure:
    ///   {log_dir}/
    ///     ├── segment-1
    ///     ├── segment-2
    ///     └── segment-N   (active)
    pub log_dir: PathBuf,

    /// Rotate to a new segment once appending would exceed this many bytes
    pub max_segment_size: u64,

    /// Capacity of the buffered writer in front of the active segment
    pub buffer_size: usize,

    // -------------------------------------------------------------------------
    // Sync Configuration
    // -------------------------------------------------------------------------
    /// Run the background periodic-sync task
    pub sync_enabled: bool,

    /// Period between background syncs
    pub sync_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            sync_enabled: DEFAULT_SYNC_ENABLED,
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Replace every unset or zero-valued option with its default
    pub fn normalized(mut self) -> Self {
        if self.log_dir.as_os_str().is_empty() {
            self.log_dir = PathBuf::from(DEFAULT_LOG_DIR);
        }
        if self.max_segment_size == 0 {
            self.max_segment_size = DEFAULT_MAX_SEGMENT_SIZE;
        }
        if self.buffer_size == 0 {
            self.buffer_size = DEFAULT_BUFFER_SIZE;
        }
        if self.sync_interval.is_zero() {
            self.sync_interval = DEFAULT_SYNC_INTERVAL;
        }
        self
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log directory (root for all segments)
    pub fn log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_dir = path.into();
        self
    }

    /// Set the maximum segment size (in bytes)
    pub fn max_segment_size(mut self, size: u64) -> Self {
        self.config.max_segment_size = size;
        self
    }

    /// Set the write buffer capacity (in bytes)
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Enable or disable the background sync task
    pub fn sync_enabled(mut self, enabled: bool) -> Self {
        self.config.sync_enabled = enabled;
        self
    }

    /// Set the background sync interval
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.config.sync_interval = interval;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
