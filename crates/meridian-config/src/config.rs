//! Filesystem roots the object-config service writes under.

use std::path::PathBuf;

/// Where the `_api` module stages generated object config, and where the
/// process keeps its runtime state (shared with the snapshot writer).
#[derive(Debug, Clone)]
pub struct Config {
    pub module_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl Config {
    pub fn new(module_dir: impl Into<PathBuf>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            module_dir: module_dir.into(),
            state_dir: state_dir.into(),
        }
    }
}
