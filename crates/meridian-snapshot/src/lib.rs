//! # meridian-snapshot: crash-safe state snapshot (C4)
//!
//! Writes every object's mask-filtered runtime attributes to a
//! length-prefixed (net-string) file atomically, and restores them on
//! startup through a bounded, blocking work queue so a slow worker applies
//! backpressure to the reader instead of letting the queue grow unbounded.

pub mod config;
pub mod dump;
pub mod error;
pub mod framing;
pub mod restore;

pub use config::SnapshotConfig;
pub use dump::dump_objects;
pub use error::{Result, SnapshotError};
pub use restore::restore_objects;
