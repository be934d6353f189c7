//! # meridian-kernel: Runtime object registry
//!
//! The kernel holds the process-wide [`registry::TypeRegistry`] and the base
//! behavior every replicated entity shares: reflective field access with
//! per-field modification tracking ([`object::ConfigurableObject`]), the
//! activation lifecycle state machine ([`activation`]), and the
//! attribute-class-filtered serializer ([`serializer`]).
//!
//! Nothing here touches disk or the network -- [`meridian_snapshot`] reads
//! and writes the on-disk format, [`meridian_cluster`] relays changes over
//! the wire. This crate only describes *what an object is* and *how it
//! changes*.

pub mod activation;
pub mod error;
pub mod object;
pub mod registry;
pub mod serializer;
pub mod signal;

pub use activation::{DefaultLifecycle, Lifecycle, LifecycleFlags, LifecycleRecorder};
pub use error::{KernelError, Result};
pub use object::ConfigurableObject;
pub use registry::{
    FieldDescriptor, FieldKind, HostServiceNameComposer, NameComposer, TypeDescriptor,
    TypeRegistry,
};
pub use signal::{MessageOrigin, NameValidator, NullSignalBus, ObjectSignal, SignalBus, SignalEnvelope};
