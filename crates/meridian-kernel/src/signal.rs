//! Change signals, origins, and cross-object name validation.
//!
//! Signals fire synchronously on the mutating thread, *after* the object's
//! monitor has been released (spec §5). The echo-prevention invariant is
//! carried explicitly through [`MessageOrigin`] rather than thread-local
//! state, per the Design Notes in spec §9.

use std::sync::Arc;

use meridian_types::{FullName, TypeName};

use crate::registry::TypeRegistry;

/// Descriptor of the peer and zone that caused a mutation.
///
/// `None` means the mutation originated locally; `Some` carries the
/// inbound message's sender so handlers can suppress re-relaying it and
/// so authorization can be checked against the sending zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOrigin {
    pub endpoint: meridian_types::EndpointName,
    pub zone: Option<meridian_types::ZoneName>,
}

impl MessageOrigin {
    pub fn new(endpoint: meridian_types::EndpointName, zone: Option<meridian_types::ZoneName>) -> Self {
        Self { endpoint, zone }
    }
}

/// A named change notification fired by a [`crate::object::ConfigurableObject`].
#[derive(Debug, Clone)]
pub enum ObjectSignal {
    /// A reflective field was committed via `SetField`.
    FieldChanged { field: String },
    /// `original-attributes` gained a new tracked entry (fired exactly once
    /// per path, on the first Config-class mutation -- spec §4.1 step 6).
    OriginalAttributesChanged { path: String },
    /// `active` flipped.
    ActiveChanged { active: bool },
    /// `paused` flipped (the negation of authority).
    PausedChanged { paused: bool },
}

/// A signal together with the object and origin it concerns.
#[derive(Debug, Clone)]
pub struct SignalEnvelope {
    pub type_name: TypeName,
    pub full_name: FullName,
    pub signal: ObjectSignal,
    pub origin: Option<MessageOrigin>,
}

/// Receives every signal fired by every object in the process.
///
/// This is the in-process event bus mentioned in spec §9: a typed channel
/// per change kind would also satisfy the contract, but a single dispatch
/// point keeps subscriber bookkeeping (the outbound relay in
/// `meridian-cluster`) in one place.
pub trait SignalBus: Send + Sync {
    fn publish(&self, envelope: SignalEnvelope);
}

/// A bus with no subscribers -- used when an object is constructed before
/// the relay is wired up, or in unit tests that don't care about signals.
#[derive(Debug, Default)]
pub struct NullSignalBus;

impl SignalBus for NullSignalBus {
    fn publish(&self, _envelope: SignalEnvelope) {}
}

/// Resolves whether a named object exists, for cross-object attribute
/// validation (spec §4.1 step 5: `ValidateName(type, name) -> bool`).
pub trait NameValidator: Send + Sync {
    fn validate_name(&self, type_name: &TypeName, name: &FullName) -> bool;
}

impl NameValidator for TypeRegistry {
    fn validate_name(&self, type_name: &TypeName, name: &FullName) -> bool {
        self.type_exists(type_name) && self.lookup(type_name, name).is_some()
    }
}

/// Convenience so a shared registry can be passed wherever a
/// `NameValidator` is expected.
pub fn validator_from_registry(registry: Arc<TypeRegistry>) -> Arc<dyn NameValidator> {
    registry
}
