//! C6: outbound event relay. Subscribes to every object's change signals
//! and republishes locally-originated ones to the peer listener (spec
//! §4.6).
//!
//! A `FieldChanged { field }` signal is translated to its fixed
//! `event::<Name>` wire method via [`crate::events`] when the field is one
//! of the checkable/notification/custom-var fields spec §4.6 names
//! (`check_interval` -> `event::SetCheckInterval`, and so on); fields
//! outside that catalogue fall back to the generic `event::FieldChanged`
//! carrying `{field, value}`. `OriginalAttributesChanged`, `ActiveChanged`,
//! and `PausedChanged` are not part of the named catalogue and keep their
//! own `event::<SignalKind>` method names.

use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use meridian_kernel::{ObjectSignal, SignalBus, SignalEnvelope, TypeRegistry};
use meridian_types::{FullName, TypeName};

use crate::events;
use crate::message::RpcMessage;
use crate::peer::{PeerListener, RelayScope};

/// Decomposes `full_name` into `(host, service)` using the type's name
/// composer when present, falling back to `full_name` as the host with no
/// service part (spec §4.6 step 2).
fn checkable_identity(registry: &TypeRegistry, type_name: &TypeName, full_name: &FullName) -> (String, Option<String>) {
    let Some(descriptor) = registry.type_descriptor(type_name) else {
        return (full_name.to_string(), None);
    };
    let Some(composer) = descriptor.name_composer() else {
        return (full_name.to_string(), None);
    };
    let parts = composer.decompose(full_name);
    let host = parts
        .iter()
        .find(|(part, _)| part == "host_name")
        .map(|(_, v)| v.clone())
        .unwrap_or_else(|| full_name.to_string());
    let service = parts
        .iter()
        .find(|(part, _)| part == "name")
        .map(|(_, v)| v.clone());
    (host, service)
}

/// Subscribes to every object in the process via [`SignalBus`] and
/// forwards locally-originated changes to whichever [`PeerListener`] is
/// currently installed.
pub struct EventRelay {
    registry: Arc<TypeRegistry>,
    peer: RwLock<Option<Arc<dyn PeerListener>>>,
}

impl EventRelay {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            peer: RwLock::new(None),
        }
    }

    /// Installs (or clears, with `None`) the peer listener singleton. In
    /// standalone mode no listener is ever installed and every signal is
    /// silently dropped (spec §4.6 step 1).
    pub fn set_peer(&self, peer: Option<Arc<dyn PeerListener>>) {
        *self.peer.write().unwrap() = peer;
    }
}

impl SignalBus for EventRelay {
    fn publish(&self, envelope: SignalEnvelope) {
        // An envelope carrying an origin means the mutation that produced
        // it was itself applied from an inbound message (the dispatcher
        // threads the origin through `Deserialize`/`ModifyAttribute`); do
        // not re-relay it, or every peer forwards forever (spec §4.7, §9).
        if envelope.origin.is_some() {
            return;
        }
        let Some(peer) = self.peer.read().unwrap().clone() else {
            return;
        };

        let (host, service) = checkable_identity(&self.registry, &envelope.type_name, &envelope.full_name);
        let mut params = Map::new();
        params.insert("host".to_string(), Value::String(host));
        if let Some(service) = service {
            params.insert("service".to_string(), Value::String(service));
        }

        let event_name = match &envelope.signal {
            ObjectSignal::FieldChanged { field } => {
                let value = self
                    .registry
                    .lookup(&envelope.type_name, &envelope.full_name)
                    .and_then(|obj| obj.get_field(field));
                match events::by_field(field) {
                    Some(fe) => {
                        if let Some(value) = value {
                            params.insert(fe.param_key.to_string(), value);
                        }
                        fe.event.to_string()
                    }
                    None => {
                        params.insert("field".to_string(), Value::String(field.clone()));
                        if let Some(value) = value {
                            params.insert("value".to_string(), value);
                        }
                        "FieldChanged".to_string()
                    }
                }
            }
            ObjectSignal::OriginalAttributesChanged { path } => {
                params.insert("path".to_string(), Value::String(path.clone()));
                "OriginalAttributesChanged".to_string()
            }
            ObjectSignal::ActiveChanged { active } => {
                params.insert("active".to_string(), Value::Bool(*active));
                "ActiveChanged".to_string()
            }
            ObjectSignal::PausedChanged { paused } => {
                params.insert("paused".to_string(), Value::Bool(*paused));
                "PausedChanged".to_string()
            }
        };

        let msg = RpcMessage::event(&event_name, Value::Object(params));
        let scope = RelayScope::Object {
            type_name: envelope.type_name,
            full_name: envelope.full_name,
        };
        peer.relay_message(None, scope, msg, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use meridian_kernel::{ConfigurableObject, FieldDescriptor, FieldKind, TypeDescriptor};
    use meridian_types::AttributeClass;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingPeer {
        relayed: Mutex<Vec<RpcMessage>>,
    }

    impl PeerListener for RecordingPeer {
        fn relay_message(
            &self,
            _origin: Option<meridian_kernel::MessageOrigin>,
            _scope: RelayScope,
            msg: RpcMessage,
            _logged: bool,
        ) {
            self.relayed.lock().unwrap().push(msg);
        }

        fn sync_send_message(&self, _dest: &meridian_types::EndpointName, _msg: RpcMessage) {}
    }

    fn host_registry() -> Arc<TypeRegistry> {
        let registry = Arc::new(TypeRegistry::new());
        registry.register_type(TypeDescriptor::new(
            TypeName::new("Host"),
            "Hosts",
            vec![FieldDescriptor::new("address", FieldKind::String, AttributeClass::CONFIG)],
        ));
        registry
    }

    #[test]
    fn local_mutation_is_relayed_with_the_checkable_identity() {
        let registry = host_registry();
        let relay = Arc::new(EventRelay::new(registry.clone()));
        let peer = Arc::new(RecordingPeer::default());
        relay.set_peer(Some(peer.clone()));

        let descriptor = registry.type_descriptor(&TypeName::new("Host")).unwrap();
        let obj = Arc::new(
            ConfigurableObject::new(descriptor, FullName::new("h1"))
                .with_bus(relay.clone()),
        );
        registry.register_object(obj.clone()).unwrap();

        obj.modify_attribute("address", json!("10.0.0.1"), None).unwrap();

        let relayed = peer.relayed.lock().unwrap();
        assert_eq!(relayed.len(), 1);
        assert_eq!(relayed[0].method, "event::FieldChanged");
        assert_eq!(relayed[0].params["host"], "h1");
        assert_eq!(relayed[0].params["value"], "10.0.0.1");
    }

    #[test]
    fn a_named_catalogue_field_relays_under_its_fixed_event_name() {
        let registry = Arc::new(TypeRegistry::new());
        registry.register_type(TypeDescriptor::new(
            TypeName::new("Host"),
            "Hosts",
            vec![FieldDescriptor::new("check_interval", FieldKind::Number, AttributeClass::CONFIG)],
        ));
        let relay = Arc::new(EventRelay::new(registry.clone()));
        let peer = Arc::new(RecordingPeer::default());
        relay.set_peer(Some(peer.clone()));

        let descriptor = registry.type_descriptor(&TypeName::new("Host")).unwrap();
        let obj = Arc::new(
            ConfigurableObject::new(descriptor, FullName::new("h1"))
                .with_bus(relay.clone()),
        );
        registry.register_object(obj.clone()).unwrap();

        obj.modify_attribute("check_interval", json!(60), None).unwrap();

        let relayed = peer.relayed.lock().unwrap();
        assert_eq!(relayed.len(), 1);
        assert_eq!(relayed[0].method, "event::SetCheckInterval");
        assert_eq!(relayed[0].params["interval"], 60);
        assert!(relayed[0].params.get("field").is_none(), "named events don't carry the generic field/value shape");
    }

    #[test]
    fn mutation_carrying_an_inbound_origin_is_not_relayed() {
        let registry = host_registry();
        let relay = Arc::new(EventRelay::new(registry.clone()));
        let peer = Arc::new(RecordingPeer::default());
        relay.set_peer(Some(peer.clone()));

        let descriptor = registry.type_descriptor(&TypeName::new("Host")).unwrap();
        let obj = Arc::new(
            ConfigurableObject::new(descriptor, FullName::new("h1"))
                .with_bus(relay.clone()),
        );
        registry.register_object(obj.clone()).unwrap();

        let origin = meridian_kernel::MessageOrigin::new(
            meridian_types::EndpointName::new("peer-1"),
            None,
        );
        obj.modify_attribute("address", json!("10.0.0.1"), Some(origin)).unwrap();

        assert!(peer.relayed.lock().unwrap().is_empty());
    }

    #[test]
    fn without_an_installed_peer_signals_are_dropped() {
        let registry = host_registry();
        let relay = Arc::new(EventRelay::new(registry.clone()));

        let descriptor = registry.type_descriptor(&TypeName::new("Host")).unwrap();
        let obj = Arc::new(
            ConfigurableObject::new(descriptor, FullName::new("h1"))
                .with_bus(relay),
        );
        registry.register_object(obj.clone()).unwrap();

        // No peer installed; this must not panic and produces nothing to
        // observe -- the assertion is simply that this returns normally.
        obj.modify_attribute("address", json!("10.0.0.1"), None).unwrap();
    }
}
