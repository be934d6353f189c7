//! Error types for the config writer and object-config service.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("i/o error writing config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Spec §4.5 `DeleteObject`: "refuse if the object's source module is
    /// not `_api`".
    #[error("object '{0}' was not created via the API and cannot be deleted through it")]
    NotApiModule(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
