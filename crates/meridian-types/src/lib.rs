//! # meridian-types: Shared identifiers for the Meridian cluster core
//!
//! This crate contains the small value types shared across the replication
//! fabric, the object registry, and the config lifecycle service:
//!
//! - Naming ([`TypeName`], [`FullName`], [`EndpointName`], [`ZoneName`])
//! - Reflective field access ([`FieldId`], [`AttributePath`])
//! - Attribute classification ([`AttributeClass`])
//! - Conflict-resolution bookkeeping ([`Version`])

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

// ============================================================================
// Naming
// ============================================================================

/// The name of a registered object type, e.g. `"Host"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A fully-qualified object name, unique within its type.
///
/// Some types compose this from structural parts (e.g. `host!service`); see
/// [`crate::name_composer::NameComposer`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FullName(String);

impl FullName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FullName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The name of a peer endpoint (process identity on the wire).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointName(String);

impl EndpointName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EndpointName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The name of a zone (authorization and routing unit).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneName(String);

impl ZoneName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ZoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ZoneName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Reflective field access
// ============================================================================

/// Opaque identifier for a field within a type descriptor.
///
/// Callers on a hot path (signal sites) should resolve a [`FieldId`] once
/// via the type descriptor and cache it, rather than re-resolving the field
/// name on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub(crate) usize);

impl FieldId {
    /// Constructs a `FieldId` from a raw index into a type descriptor's
    /// field table. Only the descriptor that produced the index should use
    /// it; mixing indices across descriptors is a programming error.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A dot-separated attribute path, e.g. `"vars.os"`.
///
/// The head token names a top-level field; remaining tokens walk into
/// nested mappings within that field's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    tokens: Vec<String>,
}

impl AttributePath {
    pub fn parse(path: &str) -> Self {
        Self {
            tokens: path.split('.').map(str::to_owned).collect(),
        }
    }

    /// The top-level field name (`tokens[0]`).
    pub fn head(&self) -> &str {
        &self.tokens[0]
    }

    /// The nested tokens after the head, in walk order.
    pub fn tail(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_nested(&self) -> bool {
        self.tokens.len() > 1
    }

    pub fn as_str(&self) -> String {
        self.tokens.join(".")
    }
}

impl Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for AttributePath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

// ============================================================================
// Attribute classification
// ============================================================================

/// Bitmask identifying which class(es) a field belongs to.
///
/// - [`AttributeClass::CONFIG`]: declared in a source file; survives restart
///   via config; mutations are tracked in `original-attributes`.
/// - [`AttributeClass::STATE`]: runtime-only but persisted across restarts
///   via the snapshot file.
/// - [`AttributeClass::INTERNAL`]: never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeClass(u8);

impl AttributeClass {
    pub const CONFIG: AttributeClass = AttributeClass(0b001);
    pub const STATE: AttributeClass = AttributeClass(0b010);
    pub const INTERNAL: AttributeClass = AttributeClass(0b100);
    pub const NONE: AttributeClass = AttributeClass(0);
    pub const ALL: AttributeClass = AttributeClass(0b111);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn union(self, other: AttributeClass) -> AttributeClass {
        AttributeClass(self.0 | other.0)
    }

    /// True if `self` and `mask` share at least one class.
    pub const fn intersects(self, mask: AttributeClass) -> bool {
        (self.0 & mask.0) != 0
    }

    pub const fn contains(self, other: AttributeClass) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for AttributeClass {
    type Output = AttributeClass;
    fn bitor(self, rhs: AttributeClass) -> AttributeClass {
        self.union(rhs)
    }
}

// ============================================================================
// Conflict resolution
// ============================================================================

/// Monotonic non-decreasing mutation counter, bumped on every tracked
/// mutation. Used by clients to detect concurrent writes; the core itself
/// does not reject older updates (last-writer-wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Version(u64);

impl Version {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_path_splits_on_dot() {
        let path = AttributePath::parse("vars.os");
        assert_eq!(path.head(), "vars");
        assert_eq!(path.tail(), &["os".to_string()]);
        assert!(path.is_nested());
    }

    #[test]
    fn attribute_path_single_token_is_not_nested() {
        let path = AttributePath::parse("enabled");
        assert_eq!(path.head(), "enabled");
        assert!(path.tail().is_empty());
        assert!(!path.is_nested());
    }

    use test_case::test_case;

    #[test_case(AttributeClass::CONFIG, true; "config is in the state|config mask")]
    #[test_case(AttributeClass::STATE, true; "state is in the state|config mask")]
    #[test_case(AttributeClass::INTERNAL, false; "internal is not in the state|config mask")]
    fn attribute_class_mask_intersection(class: AttributeClass, expected: bool) {
        let mask = AttributeClass::STATE | AttributeClass::CONFIG;
        assert_eq!(class.intersects(mask), expected);
    }

    #[test]
    fn attribute_class_all_contains_each() {
        assert!(AttributeClass::ALL.contains(AttributeClass::CONFIG));
        assert!(AttributeClass::ALL.contains(AttributeClass::STATE));
        assert!(AttributeClass::ALL.contains(AttributeClass::INTERNAL));
    }

    #[test]
    fn version_increments_monotonically() {
        let v0 = Version::zero();
        let v1 = v0.next();
        let v2 = v1.next();
        assert!(v1 > v0);
        assert!(v2 > v1);
        assert_eq!(v2.get(), 2);
    }
}
