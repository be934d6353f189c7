//! Error types for the object registry.

use thiserror::Error;

/// Errors raised by the object registry.
///
/// Precondition violations (activating an already-active object, holding
/// an object's own monitor while calling back into it) are programming
/// errors and `panic!`/`assert!` rather than appear here -- see spec §7.
#[derive(Error, Debug)]
pub enum KernelError {
    /// A `ModifyAttribute` value failed schema validation or referenced a
    /// name that does not resolve via the [`crate::signal::NameValidator`].
    #[error("invalid argument for attribute '{path}': {reason}")]
    InvalidArgument { path: String, reason: String },

    /// No field with this name exists on the type descriptor.
    #[error("type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    /// Deserialization in non-safe mode encountered a field the descriptor
    /// does not know about; untrusted (`safe = true`) input drops these
    /// silently instead.
    #[error("unknown field '{field}' in untrusted=false deserialization of '{type_name}'")]
    UnexpectedField { type_name: String, field: String },

    /// No type descriptor registered under this name.
    #[error("no type descriptor registered for '{0}'")]
    UnknownType(String),

    /// An object of this (type, name) is already registered.
    #[error("object '{1}' of type '{0}' is already registered")]
    AlreadyRegistered(String, String),
}

pub type Result<T> = std::result::Result<T, KernelError>;
