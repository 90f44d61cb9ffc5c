//! Store configuration.
//!
//! A scaled-down version of the builder/finalized-config split the reference
//! pagecache uses for its own `ConfigBuilder`/`Config`: a mutable builder
//! validated once into a cheap-to-clone, immutable `StoreConfig`. Unlike the
//! reference engine this system has no backing file, no cache, and no
//! compression, so none of that configuration surface is carried forward.

use crate::error::{Error, Result};

/// Default segment width in bytes.
///
/// The distilled spec's illustrative default: a segment width of 1 byte
/// maximizes conflict isolation (every byte is its own locking unit) at the
/// cost of per-segment bookkeeping overhead. Real deployments pick
/// something in the 64-4096 range.
pub const DEFAULT_SEGMENT_SIZE: usize = 1;

/// Default number of commits between chain compactions.
pub const DEFAULT_COMMITS_BEFORE_COMPACTION: usize = 15;

/// Builder for [`StoreConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfigBuilder {
    segment_size: usize,
    commits_before_compaction: usize,
}

impl Default for StoreConfigBuilder {
    fn default() -> Self {
        StoreConfigBuilder {
            segment_size: DEFAULT_SEGMENT_SIZE,
            commits_before_compaction: DEFAULT_COMMITS_BEFORE_COMPACTION,
        }
    }
}

impl StoreConfigBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the segment width, in bytes. The minimal locking unit of the
    /// store: two transactions that read and write within the same segment
    /// conflict at commit time even if they touch disjoint bytes within it.
    pub fn segment_size(mut self, size: usize) -> Self {
        self.segment_size = size;
        self
    }

    /// Set how many commits are allowed before the version chain is
    /// compacted.
    pub fn commits_before_compaction(mut self, n: usize) -> Self {
        self.commits_before_compaction = n;
        self
    }

    /// Validate and finalize the configuration.
    pub fn build(self) -> Result<StoreConfig> {
        if self.segment_size == 0 {
            return Err(Error::InvalidConfig(
                "segment_size must be nonzero".to_owned(),
            ));
        }
        if self.commits_before_compaction == 0 {
            return Err(Error::InvalidConfig(
                "commits_before_compaction must be nonzero".to_owned(),
            ));
        }
        Ok(StoreConfig {
            segment_size: self.segment_size,
            commits_before_compaction: self.commits_before_compaction,
        })
    }
}

/// A finalized, validated configuration used to build a [`crate::Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    segment_size: usize,
    commits_before_compaction: usize,
}

impl StoreConfig {
    /// Convenience constructor for the default configuration.
    pub fn default_config() -> StoreConfig {
        StoreConfigBuilder::default()
            .build()
            .expect("default configuration is always valid")
    }

    /// The configured segment width, in bytes.
    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// The configured compaction threshold.
    pub fn commits_before_compaction(&self) -> usize {
        self.commits_before_compaction
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
