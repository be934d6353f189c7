//! C8: repository beacon. Every 30s (first tick immediate), advertises the
//! local endpoint's host/service inventory to its parent zone (spec §4.8).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::interval;

use meridian_kernel::{HostServiceNameComposer, NameComposer, TypeRegistry};
use meridian_types::TypeName;

use crate::config::ClusterConfig;
use crate::message::RpcMessage;
use crate::peer::{PeerListener, RelayScope};

const BEACON_INTERVAL: Duration = Duration::from_secs(30);

pub struct RepositoryBeacon {
    registry: Arc<TypeRegistry>,
    peer: Arc<dyn PeerListener>,
    config: ClusterConfig,
}

impl RepositoryBeacon {
    pub fn new(registry: Arc<TypeRegistry>, peer: Arc<dyn PeerListener>, config: ClusterConfig) -> Self {
        Self { registry, peer, config }
    }

    /// Gathers `{hostName -> [serviceNames]}` plus the seen/endpoint/zone
    /// envelope and relays it as `event::UpdateRepository`, scoped to the
    /// local zone, unlogged.
    pub fn tick(&self) {
        let composer = HostServiceNameComposer;
        let mut hosts: BTreeMap<String, Vec<String>> = self
            .registry
            .all_of_type(&TypeName::new("Host"))
            .into_iter()
            .map(|h| (h.full_name().to_string(), Vec::new()))
            .collect();

        for service in self.registry.all_of_type(&TypeName::new("Service")) {
            let parts = composer.decompose(service.full_name());
            let host = parts.iter().find(|(p, _)| p == "host_name").map(|(_, v)| v.clone());
            let short_name = parts.iter().find(|(p, _)| p == "name").map(|(_, v)| v.clone());
            if let (Some(host), Some(short_name)) = (host, short_name) {
                hosts.entry(host).or_default().push(short_name);
            }
        }

        let params = json!({
            "hosts": hosts,
            "seen": chrono::Utc::now().to_rfc3339(),
            "endpoint": self.config.self_endpoint.as_str(),
            "zone": self.config.local_zone.as_str(),
            "parent_zone": self.config.parent_zone.as_ref().map(|z| z.as_str().to_string()),
        });

        let msg = RpcMessage::event("UpdateRepository", Value::from(params));
        self.peer.relay_message(
            None,
            RelayScope::Zone(self.config.local_zone.clone()),
            msg,
            false,
        );
    }

    /// Runs the beacon loop until cancelled. The first tick fires
    /// immediately on entry, matching spec §4.8.
    pub async fn run(&self) {
        let mut ticker = interval(BEACON_INTERVAL);
        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}
