//! # meridian-config: declarative config emission and the `_api` lifecycle
//!
//! Renders attribute maps into the declarative object-configuration text
//! format, stages them under the `_api` module's active stage directory,
//! and exposes the create/delete lifecycle operations that gate writes
//! through that module (spec §4.5). The grammar's own parser and
//! expression evaluator are out of scope -- see [`service::ConfigActivator`]
//! for the seam where a real one would plug in.

pub mod config;
pub mod emitter;
pub mod error;
pub mod paths;
pub mod service;

pub use config::Config;
pub use error::{ConfigError, Result};
pub use service::{ConfigActivator, DirectActivator, ObjectConfigService};
