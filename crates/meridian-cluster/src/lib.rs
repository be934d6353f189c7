//! # meridian-cluster: zone-scoped event replication and remote commands
//!
//! The wire-facing half of the core: the outbound relay (C6) and inbound
//! dispatcher (C7) that keep object state consistent across zones, the
//! repository beacon (C8), and the remote-command executor (C9). TLS
//! transport, framing, and HTTP parsing are external collaborators -- this
//! crate only ever speaks in [`message::RpcMessage`] and [`peer::PeerListener`]
//! calls (spec §1, §6).

pub mod beacon;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod executor;
pub mod message;
pub mod peer;
pub mod relay;
pub mod repository;

pub use beacon::RepositoryBeacon;
pub use config::ClusterConfig;
pub use dispatcher::EventDispatcher;
pub use error::{ClusterError, Result};
pub use executor::{EventHandlerExecutor, RemoteCheckExecutor, RemoteCommandExecutor};
pub use message::RpcMessage;
pub use peer::{PeerListener, RelayScope};
pub use relay::EventRelay;
