//! Error surface for the segment store.
//!
//! Mirrors the three-way split from the original kernel module: transient
//! resource exhaustion, optimistic-concurrency conflicts, and programmer
//! errors. The latter stay as `debug_assert!`/`unreachable!` rather than
//! `Error` variants, since they must never be reachable through correct use
//! of the public interface.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can surface from the store's public interface.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// Allocation failed while copy-on-writing a segment or extending the
    /// version chain. In safe Rust this is only reachable in practice if
    /// the global allocator itself reports failure through a fallible path;
    /// it is kept in the error surface for interface fidelity with the
    /// original `-ENOMEM` returns.
    #[error("out of memory")]
    OutOfMemory,

    /// A commit's read set no longer matched the head: some segment the
    /// transaction read was overwritten by another committer in the
    /// meantime. The caller may retry from `begin`.
    #[error("transaction rolled back due to a commit conflict")]
    RolledBack,

    /// A `StoreConfig` was invalid.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}
