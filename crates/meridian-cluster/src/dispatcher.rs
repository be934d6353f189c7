//! C7: inbound event dispatcher. Demultiplexes `event::<Name>` methods to
//! handlers; every handler validates the sender, resolves the target
//! object, authorizes, and applies the change with the origin threaded
//! through so C6 does not re-relay it (spec §4.7).

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use meridian_directory::{ObjectZoneIndex, ZoneTree};
use meridian_kernel::{serializer, HostServiceNameComposer, MessageOrigin, NameComposer, TypeRegistry};
use meridian_types::{AttributeClass, FullName, TypeName};

use crate::config::ClusterConfig;
use crate::events;
use crate::message::RpcMessage;
use crate::peer::{PeerListener, RelayScope};
use crate::repository;

/// Fallback type search order for a legacy `event::Vars` message with no
/// `object_type` field. `Service` appears twice; this is preserved as-is
/// rather than deduplicated (see the module-level open question recorded
/// in the project's DESIGN.md).
const LEGACY_VARS_FALLBACK: &[&str] =
    &["Host", "Service", "Service", "User", "EventCommand", "CheckCommand", "NotificationCommand"];

pub struct EventDispatcher {
    registry: Arc<TypeRegistry>,
    zones: Arc<ZoneTree>,
    object_zones: Arc<ObjectZoneIndex>,
    config: ClusterConfig,
    peer: Option<Arc<dyn PeerListener>>,
}

impl EventDispatcher {
    pub fn new(
        registry: Arc<TypeRegistry>,
        zones: Arc<ZoneTree>,
        object_zones: Arc<ObjectZoneIndex>,
        config: ClusterConfig,
    ) -> Self {
        Self {
            registry,
            zones,
            object_zones,
            config,
            peer: None,
        }
    }

    pub fn with_peer(mut self, peer: Arc<dyn PeerListener>) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Entry point for every inbound message. `origin.zone` is checked
    /// against the resolved target's owning zone via `CanAccessObject`
    /// unless it is absent, matching spec §4.7's common handler shape.
    pub fn handle(&self, origin: MessageOrigin, msg: &RpcMessage) {
        let Some(event_name) = msg.event_name() else {
            debug!(method = %msg.method, "dispatcher received a non-event method, ignoring");
            return;
        };
        let Value::Object(params) = &msg.params else {
            debug!(event = event_name, "event params was not an object, ignoring");
            return;
        };

        match event_name {
            "CheckResult" => self.handle_check_result(&origin, params),
            "Vars" => self.handle_vars(&origin, params),
            "AddComment" => self.handle_structured_action(&origin, params, "comments"),
            "AddDowntime" => self.handle_structured_action(&origin, params, "downtimes"),
            "UpdateRepository" => self.handle_update_repository(&origin, params),
            _ => self.handle_generic(&origin, event_name, params),
        }
    }

    /// Resolves `params.host` (and, if present, `params.service`) to a
    /// `(type, name)` pair using the same composer a config-emitted
    /// `host!service` name would use.
    fn resolve_target(&self, params: &Map<String, Value>) -> Option<(TypeName, FullName)> {
        let host = params.get("host")?.as_str()?;
        match params.get("service").and_then(Value::as_str) {
            Some(service) => {
                let composer = HostServiceNameComposer;
                Some((TypeName::new("Service"), composer.compose(&[host, service])))
            }
            None => Some((TypeName::new("Host"), FullName::new(host))),
        }
    }

    fn authorized(&self, origin: &MessageOrigin, type_name: &TypeName, full_name: &FullName) -> bool {
        match &origin.zone {
            None => true,
            Some(zone) => self.object_zones.can_access_object(&self.zones, zone, type_name, full_name),
        }
    }

    /// The common pattern: resolve, authorize, apply with the origin
    /// threaded through (spec §4.7's pseudocode). `event_name` is first
    /// checked against the fixed catalogue in [`crate::events`] -- e.g.
    /// `event::SetCheckInterval` carries its value under `interval`, not
    /// the generic `field`/`value` keys -- falling back to the generic
    /// `{field, value}` shape only for `event::FieldChanged` and any other
    /// method outside the named catalogue.
    fn handle_generic(&self, origin: &MessageOrigin, event_name: &str, params: &Map<String, Value>) {
        let Some((type_name, full_name)) = self.resolve_target(params) else {
            return;
        };
        if !self.authorized(origin, &type_name, &full_name) {
            warn!(%type_name, %full_name, "unauthorized event, dropping");
            return;
        }
        let Some(obj) = self.registry.lookup(&type_name, &full_name) else {
            return;
        };

        let (field, value) = match events::by_event(event_name) {
            Some(fe) => {
                let Some(value) = params.get(fe.param_key) else {
                    return;
                };
                (fe.field, value.clone())
            }
            None => {
                let Some(field) = params.get("field").and_then(Value::as_str) else {
                    return;
                };
                let Some(value) = params.get("value") else {
                    return;
                };
                (field, value.clone())
            }
        };

        if let Err(e) = obj.modify_attribute(field, value, Some(origin.clone())) {
            warn!(%type_name, %full_name, error = %e, "rejected inbound field update");
        }
    }

    fn handle_check_result(&self, origin: &MessageOrigin, params: &Map<String, Value>) {
        let Some((type_name, full_name)) = self.resolve_target(params) else {
            return;
        };
        if !self.authorized(origin, &type_name, &full_name) {
            warn!(%type_name, %full_name, "unauthorized check result, dropping");
            return;
        }
        let Some(obj) = self.registry.lookup(&type_name, &full_name) else {
            return;
        };

        let mut cr = params.clone();
        if let Some(Value::Object(_)) = cr.get("performance_data") {
            // Already a mapping of already-serialized perfdata entries;
            // left as-is per spec §4.6's inline-perfdata rule.
        }

        // A reply from the endpoint we delegated the check to is applied
        // without an origin so the normal local reaction (notifications,
        // dependency propagation) runs; anything else carries the origin
        // so it is known to have arrived over the wire.
        let command_endpoint = obj
            .get_ext("command_endpoint")
            .and_then(|v| v.as_str().map(str::to_string));
        let apply_origin = if command_endpoint.as_deref() == Some(origin.endpoint.as_str()) {
            None
        } else {
            Some(origin.clone())
        };

        cr.remove("host");
        cr.remove("service");
        if let Err(e) = serializer::deserialize(&obj, &cr, true, AttributeClass::ALL, apply_origin) {
            warn!(%type_name, %full_name, error = %e, "rejected inbound check result");
        }
    }

    fn handle_vars(&self, origin: &MessageOrigin, params: &Map<String, Value>) {
        let Some(host) = params.get("host").and_then(Value::as_str) else {
            return;
        };
        let service = params.get("service").and_then(Value::as_str);

        let (type_name, full_name) = if let Some(object_type) = params.get("object_type").and_then(Value::as_str) {
            (TypeName::new(object_type), FullName::new(host))
        } else {
            let mut resolved = None;
            for candidate in LEGACY_VARS_FALLBACK {
                let full_name = if *candidate == "Service" {
                    match service {
                        Some(service) => HostServiceNameComposer.compose(&[host, service]),
                        None => continue,
                    }
                } else {
                    FullName::new(host)
                };
                let type_name = TypeName::new(*candidate);
                if self.registry.lookup(&type_name, &full_name).is_some() {
                    resolved = Some((type_name, full_name));
                    break;
                }
            }
            match resolved {
                Some(found) => found,
                None => return,
            }
        };

        if !self.authorized(origin, &type_name, &full_name) {
            warn!(%type_name, %full_name, "unauthorized vars update, dropping");
            return;
        }
        let Some(obj) = self.registry.lookup(&type_name, &full_name) else {
            return;
        };
        let Some(vars) = params.get("vars") else {
            return;
        };
        if let Err(e) = obj.modify_attribute("vars", vars.clone(), Some(origin.clone())) {
            warn!(%type_name, %full_name, error = %e, "rejected inbound vars update");
        }
    }

    /// `AddComment` / `AddDowntime`: the kernel has no dedicated comment or
    /// downtime aggregate, so the structured payload is appended to the
    /// target's extension bag under `bucket` -- the closest primitive the
    /// registry offers for attaching transient, non-field context (spec
    /// §3's extensions mapping).
    fn handle_structured_action(&self, origin: &MessageOrigin, params: &Map<String, Value>, bucket: &str) {
        let Some((type_name, full_name)) = self.resolve_target(params) else {
            return;
        };
        if !self.authorized(origin, &type_name, &full_name) {
            warn!(%type_name, %full_name, action = bucket, "unauthorized structured action, dropping");
            return;
        }
        let Some(obj) = self.registry.lookup(&type_name, &full_name) else {
            return;
        };
        let mut entries = obj
            .get_ext(bucket)
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default();
        entries.push(Value::Object(params.clone()));
        obj.set_ext(bucket, Value::Array(entries));
    }

    fn handle_update_repository(&self, origin: &MessageOrigin, params: &Map<String, Value>) {
        let dir = self.config.repository_dir();
        if let Err(e) = repository::write_repository(&dir, &origin.endpoint, &Value::Object(params.clone())) {
            warn!(endpoint = %origin.endpoint, error = %e, "failed to persist repository update");
            return;
        }
        if let Some(peer) = &self.peer {
            let msg = RpcMessage::event("UpdateRepository", Value::Object(params.clone()));
            peer.relay_message(
                Some(origin.clone()),
                RelayScope::Zone(self.config.local_zone.clone()),
                msg,
                false,
            );
        }
    }
}
