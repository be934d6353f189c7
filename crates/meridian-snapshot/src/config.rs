//! Injected configuration for snapshot write/restore (spec §6 "CLI and env
//! vars" -- the core only consumes already-resolved values).

/// Tunables the restore queue needs; not a config-loading framework, since
/// there's no declarative grammar on this side of the boundary to parse.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Bounded work-queue capacity (spec §4.4, §5: 25 000).
    pub queue_capacity: usize,
    /// Number of worker threads draining the restore queue.
    pub concurrency: usize,
}

impl SnapshotConfig {
    pub fn new(concurrency: usize) -> Self {
        Self {
            queue_capacity: 25_000,
            concurrency: concurrency.max(1),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::new(4)
    }
}
