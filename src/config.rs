//! Configuration for hashlib tables
//!
//! Centralized configuration with sensible defaults.

/// Configuration for a [`Table`](crate::Table) and its persistence passes
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// Requested number of buckets. Rounded up to the next prime at creation;
    /// fixed for the lifetime of the table.
    pub capacity: usize,

    // -------------------------------------------------------------------------
    // Persistence Configuration
    // -------------------------------------------------------------------------
    /// Buffer size used by `store` and `retrieve` (in bytes)
    pub io_buffer_size: usize,

    /// fsync the file after `store` has flushed it
    pub sync_on_store: bool,

    /// Treat a header count that disagrees with the records as an error
    /// instead of a warning
    pub strict_count: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1009,
            io_buffer_size: 64 * 1024, // 64 KB
            sync_on_store: true,
            strict_count: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the requested bucket count
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the I/O buffer size (in bytes)
    pub fn io_buffer_size(mut self, size: usize) -> Self {
        self.config.io_buffer_size = size;
        self
    }

    /// Enable or disable fsync after store
    pub fn sync_on_store(mut self, sync: bool) -> Self {
        self.config.sync_on_store = sync;
        self
    }

    /// Enable or disable strict header count verification on retrieve
    pub fn strict_count(mut self, strict: bool) -> Self {
        self.config.strict_count = strict;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
