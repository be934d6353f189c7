//! Error types for the snapshot writer and restore queue.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing or reading a snapshot file.
///
/// Per-record parse/apply failures during restore are not represented here
/// -- they are logged and the record is skipped (spec §4.4); only whole-file
/// I/O failures are fatal.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("i/o error on snapshot file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rename {temp_path} -> {path} failed: {source}")]
    Rename {
        temp_path: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
