//! Type descriptors and the process-wide type registry.
//!
//! Type descriptors are created once, during static initialization, and are
//! never destroyed -- see spec §3. The registry stores one descriptor and
//! one object index per type name; the per-type index uses its own lock so
//! registration of one type never blocks lookups against another.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use meridian_types::{AttributeClass, FieldId, FullName, TypeName};

use crate::error::{KernelError, Result};
use crate::object::ConfigurableObject;

// ============================================================================
// Field / type descriptors
// ============================================================================

/// The semantic shape a field's value is expected to take.
///
/// This is deliberately coarse: the declarative configuration grammar and
/// its expression evaluator are out of scope (spec §1); `ModifyAttribute`
/// only needs enough shape information to reject obviously malformed
/// values and to resolve cross-object name references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Number,
    String,
    Array,
    Object,
    /// A string value that must name a live object of the given type
    /// (resolved via [`crate::signal::NameValidator::validate_name`]).
    NameRef(TypeName),
    /// No shape constraint.
    Any,
}

impl FieldKind {
    fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Number => value.is_number(),
            FieldKind::String => value.is_string(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
            FieldKind::NameRef(_) => value.is_string(),
            FieldKind::Any => true,
        }
    }
}

/// Metadata for a single reflective field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub class: AttributeClass,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind, class: AttributeClass) -> Self {
        Self {
            name: name.into(),
            kind,
            class,
        }
    }
}

/// Decomposes a fully-qualified name into the structural parts that become
/// implicit attributes during config emission (spec §4.5, §9).
///
/// Types without a composite name (the common case) simply have no
/// [`NameComposer`] registered; the full name is then the only name part.
pub trait NameComposer: Send + Sync {
    /// Splits `full_name` into an ordered list of `(part_name, value)`
    /// pairs. Returns an empty vec if `full_name` does not decompose.
    fn decompose(&self, full_name: &FullName) -> Vec<(String, String)>;

    /// Composes a full name back out of its structural parts, in the same
    /// order [`NameComposer::decompose`] would return them.
    fn compose(&self, parts: &[&str]) -> FullName;
}

/// The classic `host!service` composite name used by checkable services.
#[derive(Debug, Default)]
pub struct HostServiceNameComposer;

impl NameComposer for HostServiceNameComposer {
    fn decompose(&self, full_name: &FullName) -> Vec<(String, String)> {
        match full_name.as_str().split_once('!') {
            Some((host, service)) => vec![
                ("host_name".to_string(), host.to_string()),
                ("name".to_string(), service.to_string()),
            ],
            None => Vec::new(),
        }
    }

    fn compose(&self, parts: &[&str]) -> FullName {
        FullName::new(parts.join("!"))
    }
}

/// A type's field layout, plural name, and optional name composer.
pub struct TypeDescriptor {
    pub name: TypeName,
    pub plural: String,
    fields: Vec<FieldDescriptor>,
    field_index: HashMap<String, FieldId>,
    name_composer: Option<Arc<dyn NameComposer>>,
}

impl TypeDescriptor {
    pub fn new(name: TypeName, plural: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        let field_index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), FieldId::from_index(i)))
            .collect();
        Self {
            name,
            plural: plural.into(),
            fields,
            field_index,
            name_composer: None,
        }
    }

    pub fn with_name_composer(mut self, composer: Arc<dyn NameComposer>) -> Self {
        self.name_composer = Some(composer);
        self
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.field_index.get(name).copied()
    }

    pub fn field(&self, id: FieldId) -> &FieldDescriptor {
        &self.fields[id.index()]
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn name_composer(&self) -> Option<&Arc<dyn NameComposer>> {
        self.name_composer.as_ref()
    }

    pub(crate) fn validate_value(
        &self,
        field: FieldId,
        value: &serde_json::Value,
    ) -> std::result::Result<(), String> {
        let descriptor = self.field(field);
        if descriptor.kind.matches(value) {
            Ok(())
        } else {
            Err(format!(
                "field '{}' expects {:?}, got {}",
                descriptor.name, descriptor.kind, value
            ))
        }
    }
}

impl std::fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Bool => write!(f, "Bool"),
            FieldKind::Number => write!(f, "Number"),
            FieldKind::String => write!(f, "String"),
            FieldKind::Array => write!(f, "Array"),
            FieldKind::Object => write!(f, "Object"),
            FieldKind::NameRef(t) => write!(f, "NameRef({t})"),
            FieldKind::Any => write!(f, "Any"),
        }
    }
}

// ============================================================================
// Type registry
// ============================================================================

struct TypeEntry {
    descriptor: Arc<TypeDescriptor>,
    objects: RwLock<HashMap<FullName, Arc<ConfigurableObject>>>,
}

/// Process-wide registry of type descriptors and their live object indices.
///
/// Registration of a brand-new type takes the outer write lock; everything
/// else (object register/unregister/lookup) only ever touches the relevant
/// type's own lock, so operations on `Host` never contend with operations
/// on `Service`.
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<TypeName, Arc<TypeEntry>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type descriptor. Idempotent: re-registering the same
    /// type name replaces the descriptor but keeps any already-registered
    /// objects under the new descriptor's index.
    pub fn register_type(&self, descriptor: TypeDescriptor) {
        let name = descriptor.name.clone();
        let mut types = self.types.write().unwrap();
        let objects = types
            .get(&name)
            .map(|entry| {
                std::mem::take(&mut *entry.objects.write().unwrap())
            })
            .unwrap_or_default();
        types.insert(
            name,
            Arc::new(TypeEntry {
                descriptor: Arc::new(descriptor),
                objects: RwLock::new(objects),
            }),
        );
    }

    pub fn type_descriptor(&self, type_name: &TypeName) -> Option<Arc<TypeDescriptor>> {
        self.types
            .read()
            .unwrap()
            .get(type_name)
            .map(|e| e.descriptor.clone())
    }

    pub fn type_exists(&self, type_name: &TypeName) -> bool {
        self.types.read().unwrap().contains_key(type_name)
    }

    fn entry(&self, type_name: &TypeName) -> Result<Arc<TypeEntry>> {
        self.types
            .read()
            .unwrap()
            .get(type_name)
            .cloned()
            .ok_or_else(|| KernelError::UnknownType(type_name.to_string()))
    }

    /// Registers a constructed object under its (type, name). At most one
    /// object may exist per (type, name) -- spec §3 invariant.
    pub fn register_object(&self, obj: Arc<ConfigurableObject>) -> Result<()> {
        let entry = self.entry(obj.type_name())?;
        let mut objects = entry.objects.write().unwrap();
        if objects.contains_key(obj.full_name()) {
            return Err(KernelError::AlreadyRegistered(
                obj.type_name().to_string(),
                obj.full_name().to_string(),
            ));
        }
        objects.insert(obj.full_name().clone(), obj);
        Ok(())
    }

    pub fn unregister(&self, type_name: &TypeName, full_name: &FullName) -> Option<Arc<ConfigurableObject>> {
        let entry = self.entry(type_name).ok()?;
        entry.objects.write().unwrap().remove(full_name)
    }

    pub fn lookup(&self, type_name: &TypeName, full_name: &FullName) -> Option<Arc<ConfigurableObject>> {
        let entry = self.entry(type_name).ok()?;
        entry.objects.read().unwrap().get(full_name).cloned()
    }

    /// All live objects of a given type, in unspecified order.
    pub fn all_of_type(&self, type_name: &TypeName) -> Vec<Arc<ConfigurableObject>> {
        match self.entry(type_name) {
            Ok(entry) => entry.objects.read().unwrap().values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Every live object across every registered type, in unspecified order.
    pub fn all_objects(&self) -> Vec<Arc<ConfigurableObject>> {
        let types = self.types.read().unwrap();
        types
            .values()
            .flat_map(|entry| entry.objects.read().unwrap().values().cloned().collect::<Vec<_>>())
            .collect()
    }

    /// Deactivates every registered object, in arbitrary order -- there is
    /// no dependency tracking between objects (spec §3 "Ownership").
    pub fn stop_objects(&self) {
        let types = self.types.read().unwrap();
        for entry in types.values() {
            let objects = entry.objects.read().unwrap();
            for obj in objects.values() {
                obj.deactivate(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_types::FullName;

    fn host_descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            TypeName::new("Host"),
            "Hosts",
            vec![FieldDescriptor::new(
                "address",
                FieldKind::String,
                AttributeClass::CONFIG,
            )],
        )
    }

    #[test]
    fn at_most_one_object_per_type_and_name() {
        let registry = TypeRegistry::new();
        registry.register_type(host_descriptor());
        let descriptor = registry.type_descriptor(&TypeName::new("Host")).unwrap();
        let obj = Arc::new(ConfigurableObject::new(
            descriptor.clone(),
            FullName::new("h1"),
        ));
        registry.register_object(obj).unwrap();

        let dup = Arc::new(ConfigurableObject::new(descriptor, FullName::new("h1")));
        assert!(matches!(
            registry.register_object(dup),
            Err(KernelError::AlreadyRegistered(_, _))
        ));
    }

    #[test]
    fn lookup_of_unregistered_type_is_none_not_panic() {
        let registry = TypeRegistry::new();
        assert!(registry
            .lookup(&TypeName::new("Nope"), &FullName::new("x"))
            .is_none());
    }

    #[test]
    fn host_service_name_composer_round_trips() {
        let composer = HostServiceNameComposer;
        let parts = composer.decompose(&FullName::new("h1!ping"));
        assert_eq!(
            parts,
            vec![
                ("host_name".to_string(), "h1".to_string()),
                ("name".to_string(), "ping".to_string()),
            ]
        );
        assert_eq!(composer.compose(&["h1", "ping"]), FullName::new("h1!ping"));
    }

    #[test]
    fn missing_name_composer_does_not_decompose() {
        let composer = HostServiceNameComposer;
        assert!(composer.decompose(&FullName::new("h1")).is_empty());
    }
}
