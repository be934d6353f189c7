//! The peer listener: external transport collaborator (spec §3, §6). TLS
//! framing and the actual socket plumbing live outside this crate; callers
//! inject an implementation of [`PeerListener`].

use meridian_kernel::MessageOrigin;
use meridian_types::{EndpointName, FullName, TypeName, ZoneName};

use crate::message::RpcMessage;

/// What a relayed message is scoped to: a single object (per-object
/// events) or an entire zone (the repository beacon).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayScope {
    Object { type_name: TypeName, full_name: FullName },
    Zone(ZoneName),
}

/// The transport seam C6 and C9 call into. `relay_message` is fire-and-
/// forget broadcast to whichever peers the scope reaches; `sync_send_message`
/// is a point-to-point reply (used by the remote-command executor and the
/// repository handler's echo back to the requester).
pub trait PeerListener: Send + Sync {
    fn relay_message(
        &self,
        origin: Option<MessageOrigin>,
        scope: RelayScope,
        msg: RpcMessage,
        logged: bool,
    );

    fn sync_send_message(&self, dest: &EndpointName, msg: RpcMessage);
}
