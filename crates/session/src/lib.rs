//! `segdb-session`: a byte-addressed stream adapter over
//! [`segdb_engine::Store`].
//!
//! The engine speaks in fixed-size segments; most callers would rather
//! think in plain byte offsets. [`Session`] bridges the two, splitting
//! reads and writes at segment boundaries and holding a transaction open
//! across calls until explicitly committed or rolled back.

mod error;
mod session;

pub use error::{Error, Result};
pub use session::Session;
