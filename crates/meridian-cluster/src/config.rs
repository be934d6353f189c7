//! Injected configuration for the replication fabric (spec §6 "CLI and env
//! vars. Not in scope; the core consumes `stateDir`, `moduleDir`,
//! `concurrency`, `acceptCommands` as injected configuration.").

use std::path::PathBuf;

use meridian_types::{EndpointName, ZoneName};

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub state_dir: PathBuf,
    /// Product name segment of the repository file path
    /// (`<stateDir>/lib/<product>/api/repository/...`).
    pub product: String,
    pub self_endpoint: EndpointName,
    pub local_zone: ZoneName,
    pub parent_zone: Option<ZoneName>,
    /// Whether `ExecuteCommand` requests are honored locally.
    pub accept_commands: bool,
}

impl ClusterConfig {
    pub fn new(state_dir: impl Into<PathBuf>, self_endpoint: EndpointName, local_zone: ZoneName) -> Self {
        Self {
            state_dir: state_dir.into(),
            product: "meridian".to_string(),
            self_endpoint,
            local_zone,
            parent_zone: None,
            accept_commands: true,
        }
    }

    pub fn with_parent_zone(mut self, parent_zone: ZoneName) -> Self {
        self.parent_zone = Some(parent_zone);
        self
    }

    pub fn with_accept_commands(mut self, accept_commands: bool) -> Self {
        self.accept_commands = accept_commands;
        self
    }

    /// `<stateDir>/lib/<product>/api/repository` (spec §6).
    pub fn repository_dir(&self) -> PathBuf {
        self.state_dir
            .join("lib")
            .join(&self.product)
            .join("api")
            .join("repository")
    }
}
