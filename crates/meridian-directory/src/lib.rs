//! # meridian-directory: zone tree and access authorization
//!
//! The zone tree and the per-object ownership index backing every
//! `CanAccessObject` / `IsChildOf` check used by the event dispatcher and
//! the remote-command executor (spec §3, §4.7).

pub mod error;
pub mod object_zone;
pub mod zone;

pub use error::{DirectoryError, Result};
pub use object_zone::ObjectZoneIndex;
pub use zone::ZoneTree;
