//! C9: remote-command executor. Services `ExecuteCommand` requests by
//! fabricating a transient host object, invoking the requested check or
//! event command through an injected collaborator, and always producing a
//! reply -- success or a synthetic `Unknown` result (spec §4.7
//! `ExecuteCommand`, §7 "Remote-command failures").

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::warn;

use meridian_directory::ZoneTree;
use meridian_kernel::{ConfigurableObject, FieldDescriptor, FieldKind, MessageOrigin, TypeDescriptor};
use meridian_types::{AttributeClass, FullName, TypeName};

use crate::config::ClusterConfig;
use crate::message::RpcMessage;
use crate::peer::PeerListener;

/// Runs a check command against the macro set the requester supplied.
/// The actual check-execution engine is out of scope (spec §1); this is
/// the seam an embedder wires a real one into.
pub trait RemoteCheckExecutor: Send + Sync {
    fn execute_remote_check(&self, macros: &Map<String, Value>) -> Result<Value, String>;
}

/// Runs an event handler command. `notify` mirrors the upstream
/// `ExecuteEventHandler(macros, true)` call shape, where the boolean marks
/// this as a request-triggered (not check-triggered) invocation.
pub trait EventHandlerExecutor: Send + Sync {
    fn execute_event_handler(&self, macros: &Map<String, Value>, notify: bool) -> Result<(), String>;
}

fn transient_host_descriptor() -> Arc<TypeDescriptor> {
    Arc::new(TypeDescriptor::new(
        TypeName::new("Host"),
        "Hosts",
        vec![FieldDescriptor::new("address", FieldKind::String, AttributeClass::CONFIG)],
    ))
}

fn synthetic_unknown_result(host: &str, service: Option<&str>, output: String) -> RpcMessage {
    let mut params = Map::new();
    params.insert("host".to_string(), Value::String(host.to_string()));
    if let Some(service) = service {
        params.insert("service".to_string(), Value::String(service.to_string()));
    }
    params.insert(
        "cr".to_string(),
        json!({ "state": "Unknown", "output": output, "performance_data": Value::Null }),
    );
    RpcMessage::event("CheckResult", Value::Object(params))
}

pub struct RemoteCommandExecutor {
    zones: Arc<ZoneTree>,
    config: ClusterConfig,
    peer: Arc<dyn PeerListener>,
    check_executor: Arc<dyn RemoteCheckExecutor>,
    event_executor: Arc<dyn EventHandlerExecutor>,
}

impl RemoteCommandExecutor {
    pub fn new(
        zones: Arc<ZoneTree>,
        config: ClusterConfig,
        peer: Arc<dyn PeerListener>,
        check_executor: Arc<dyn RemoteCheckExecutor>,
        event_executor: Arc<dyn EventHandlerExecutor>,
    ) -> Self {
        Self {
            zones,
            config,
            peer,
            check_executor,
            event_executor,
        }
    }

    /// Spec §4.7: authorization here is stricter than the general
    /// `CanAccessObject` check -- the sender must be a zone ancestor of
    /// the local zone, never a sibling or descendant.
    fn sender_may_command_us(&self, origin: &MessageOrigin) -> bool {
        match &origin.zone {
            Some(sender_zone) => self.zones.is_child_of(&self.config.local_zone, sender_zone),
            None => false,
        }
    }

    pub fn handle_execute_command(&self, origin: MessageOrigin, params: &Map<String, Value>) {
        let Some(host) = params.get("host").and_then(Value::as_str) else {
            return;
        };
        let service = params.get("service").and_then(Value::as_str);

        if !self.sender_may_command_us(&origin) {
            warn!(endpoint = %origin.endpoint, "unauthorized ExecuteCommand, dropping");
            return;
        }

        if !self.config.accept_commands {
            let reply = synthetic_unknown_result(
                host,
                service,
                format!(
                    "Endpoint '{}' does not accept commands.",
                    self.config.self_endpoint
                ),
            );
            self.peer.sync_send_message(&origin.endpoint, reply);
            return;
        }

        let Some(command) = params.get("command").and_then(Value::as_str) else {
            let reply = synthetic_unknown_result(host, service, "No command given.".to_string());
            self.peer.sync_send_message(&origin.endpoint, reply);
            return;
        };

        let macros = params
            .get("macros")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        // Transient host, never registered: only its extension bag is used
        // to carry the command's identity into the executor collaborator
        // (spec §3's extensions mapping; §4.7's "fabricates a transient
        // Host object carrying the requested command-type and endpoint
        // metadata as extensions").
        let transient = ConfigurableObject::new(transient_host_descriptor(), FullName::new(host));
        transient.set_ext("command", Value::String(command.to_string()));
        transient.set_ext("requesting_endpoint", Value::String(origin.endpoint.to_string()));

        let is_event_command = params.get("command_type").and_then(Value::as_str) == Some("event_command");

        let outcome = if is_event_command {
            self.event_executor
                .execute_event_handler(&macros, true)
                .map(|_| json!({ "state": "Ok", "output": format!("Event handler '{command}' executed."), "performance_data": Value::Null }))
        } else {
            self.check_executor.execute_remote_check(&macros)
        };

        match outcome {
            Ok(cr) => {
                let mut reply_params = Map::new();
                reply_params.insert("host".to_string(), Value::String(host.to_string()));
                if let Some(service) = service {
                    reply_params.insert("service".to_string(), Value::String(service.to_string()));
                }
                reply_params.insert("cr".to_string(), cr);
                self.peer
                    .sync_send_message(&origin.endpoint, RpcMessage::event("CheckResult", Value::Object(reply_params)));
            }
            Err(diagnostic) => {
                let reply = synthetic_unknown_result(host, service, diagnostic);
                self.peer.sync_send_message(&origin.endpoint, reply);
            }
        }
    }
}
