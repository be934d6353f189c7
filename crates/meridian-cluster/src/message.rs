//! The wire envelope: JSON-RPC 2.0 with `method` of the form `event::<Name>`
//! (spec §4.6, §6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcMessage {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
}

impl RpcMessage {
    pub fn event(name: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method: format!("event::{name}"),
            params,
        }
    }

    /// The `<Name>` part of an `event::<Name>` method, if this message is
    /// one of ours.
    pub fn event_name(&self) -> Option<&str> {
        self.method.strip_prefix("event::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_strips_the_prefix() {
        let msg = RpcMessage::event("SetCheckInterval", serde_json::json!({"host": "h1"}));
        assert_eq!(msg.method, "event::SetCheckInterval");
        assert_eq!(msg.event_name(), Some("SetCheckInterval"));
        assert_eq!(msg.jsonrpc, "2.0");
    }
}
