//! The object-config lifecycle service (spec §4.5 `CreateObject` /
//! `DeleteObject`).
//!
//! The declarative grammar's parser and expression evaluator are out of
//! scope; this service only ever produces the staged `.conf` text an
//! external compiler would later read back. The final compile-evaluate-
//! commit-activate step is represented by the injected [`ConfigActivator`]
//! seam so the full operation sequence still has a place to hook in a real
//! grammar implementation without this crate depending on one.

use std::sync::Arc;

use serde_json::{Map, Value};

use meridian_kernel::{ConfigurableObject, TypeDescriptor, TypeRegistry};
use meridian_types::FullName;

use crate::config::Config;
use crate::emitter::emit_object_item;
use crate::error::{ConfigError, Result};
use crate::paths::object_conf_path;

/// Key used on [`ConfigurableObject`]'s extension bag to record which
/// module created the object -- `DeleteObject` refuses unless it is
/// `"_api"` (spec §4.5).
pub const MODULE_EXT_KEY: &str = "module";

/// The compile-evaluate-commit-activate pipeline the real grammar
/// implementation would own. Given attributes already known to be
/// well-formed (this service built them), an implementation parses its own
/// staged text back, evaluates it, and activates the resulting object.
///
/// [`DirectActivator`] is the implementation used wherever no real grammar
/// evaluator is wired in: it applies the same attributes directly, without
/// a text round-trip.
pub trait ConfigActivator: Send + Sync {
    fn activate(
        &self,
        registry: &TypeRegistry,
        type_descriptor: &Arc<TypeDescriptor>,
        full_name: &FullName,
        attrs: &Map<String, Value>,
    ) -> std::result::Result<Arc<ConfigurableObject>, String>;
}

/// Builds the object directly from the already-validated attribute map and
/// activates it -- what every caller gets until a real grammar evaluator
/// exists to read the staged `.conf` text back.
#[derive(Debug, Default)]
pub struct DirectActivator;

impl ConfigActivator for DirectActivator {
    fn activate(
        &self,
        registry: &TypeRegistry,
        type_descriptor: &Arc<TypeDescriptor>,
        full_name: &FullName,
        attrs: &Map<String, Value>,
    ) -> std::result::Result<Arc<ConfigurableObject>, String> {
        let obj = Arc::new(ConfigurableObject::new(
            type_descriptor.clone(),
            full_name.clone(),
        ));
        for (path, value) in attrs {
            obj.modify_attribute(path, value.clone(), None)
                .map_err(|e| e.to_string())?;
        }
        obj.set_ext(MODULE_EXT_KEY, Value::String("_api".to_string()));
        registry
            .register_object(obj.clone())
            .map_err(|e| e.to_string())?;
        obj.activate(None);
        Ok(obj)
    }
}

/// Stages and activates `_api`-sourced objects, and tears them back down.
pub struct ObjectConfigService {
    config: Config,
    activator: Arc<dyn ConfigActivator>,
}

impl ObjectConfigService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            activator: Arc::new(DirectActivator),
        }
    }

    pub fn with_activator(mut self, activator: Arc<dyn ConfigActivator>) -> Self {
        self.activator = activator;
        self
    }

    /// Spec §4.5 `CreateObject`: decompose `full_name` into its structural
    /// parts (if the type has a name composer), merge them into `attrs`,
    /// render the item text, stage it under `_api`'s active stage, then
    /// hand off to the activator. Errors from either the staging write or
    /// the activator are collected under a "collect errors, do not apply
    /// any attribute" rule -- nothing here is partially
    /// applied to the registry on a staging failure since the activator
    /// only runs after the file write succeeds.
    pub fn create_object(
        &self,
        registry: &TypeRegistry,
        type_descriptor: Arc<TypeDescriptor>,
        full_name: FullName,
        templates: &[String],
        mut attrs: Map<String, Value>,
    ) -> std::result::Result<Arc<ConfigurableObject>, Vec<String>> {
        if let Some(composer) = type_descriptor.name_composer() {
            for (part_name, part_value) in composer.decompose(&full_name) {
                if part_name != "name" {
                    attrs.insert(part_name, Value::String(part_value));
                }
            }
        }

        let text = emit_object_item(
            "object",
            type_descriptor.name.as_str(),
            full_name.as_str(),
            templates,
            &attrs,
        );

        let plural_lower = type_descriptor.plural.to_lowercase();
        let path = object_conf_path(&self.config.module_dir, &plural_lower, full_name.as_str())
            .map_err(|source| {
                vec![ConfigError::Io {
                    path: self.config.module_dir.clone(),
                    source,
                }
                .to_string()]
            })?;
        std::fs::write(&path, text).map_err(|source| {
            vec![ConfigError::Io {
                path: path.clone(),
                source,
            }
            .to_string()]
        })?;

        self.activator
            .activate(registry, &type_descriptor, &full_name, &attrs)
            .map_err(|e| vec![e])
    }

    /// Spec §4.5 `DeleteObject`: refuses objects not sourced from `_api`,
    /// otherwise deactivates, unregisters, and removes the staged file.
    pub fn delete_object(
        &self,
        registry: &TypeRegistry,
        obj: &Arc<ConfigurableObject>,
    ) -> Result<()> {
        let module = obj.get_ext(MODULE_EXT_KEY);
        let is_api = matches!(&module, Some(Value::String(m)) if m == "_api");
        if !is_api {
            return Err(ConfigError::NotApiModule(obj.full_name().to_string()));
        }

        obj.deactivate(None);
        registry.unregister(obj.type_name(), obj.full_name());

        let plural_lower = obj.descriptor_handle().plural.to_lowercase();
        if let Ok(path) =
            object_conf_path(&self.config.module_dir, &plural_lower, obj.full_name().as_str())
        {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_kernel::{FieldDescriptor, FieldKind, TypeDescriptor};
    use meridian_types::{AttributeClass, TypeName};

    fn host_descriptor() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::new(
            TypeName::new("Host"),
            "Hosts",
            vec![FieldDescriptor::new(
                "address",
                FieldKind::String,
                AttributeClass::CONFIG,
            )],
        ))
    }

    fn service() -> (ObjectConfigService, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::new(tmp.path(), tmp.path().join("state"));
        (ObjectConfigService::new(config), tmp)
    }

    #[test]
    fn create_object_stages_a_conf_file_and_activates() {
        let (service, tmp) = service();
        let registry = TypeRegistry::new();
        registry.register_type(TypeDescriptor::new(
            TypeName::new("Host"),
            "Hosts",
            host_descriptor().fields().to_vec(),
        ));
        let mut attrs = Map::new();
        attrs.insert("address".to_string(), Value::String("10.0.0.1".into()));

        let obj = service
            .create_object(&registry, host_descriptor(), FullName::new("h1"), &[], attrs)
            .unwrap();

        assert!(obj.is_active());
        assert_eq!(
            obj.get_field("address"),
            Some(Value::String("10.0.0.1".into()))
        );
        let staged = tmp
            .path()
            .join("_api")
            .join(crate::paths::ACTIVE_STAGE)
            .join("conf.d")
            .join("hosts")
            .join("h1.conf");
        assert!(staged.is_file());
    }

    #[test]
    fn delete_object_refuses_non_api_objects() {
        let (service, _tmp) = service();
        let registry = TypeRegistry::new();
        registry.register_type(TypeDescriptor::new(
            TypeName::new("Host"),
            "Hosts",
            host_descriptor().fields().to_vec(),
        ));
        let obj = Arc::new(ConfigurableObject::new(host_descriptor(), FullName::new("h1")));
        registry.register_object(obj.clone()).unwrap();

        assert!(matches!(
            service.delete_object(&registry, &obj),
            Err(ConfigError::NotApiModule(_))
        ));
    }

    #[test]
    fn delete_object_removes_the_staged_file_and_unregisters() {
        let (service, tmp) = service();
        let registry = TypeRegistry::new();
        registry.register_type(TypeDescriptor::new(
            TypeName::new("Host"),
            "Hosts",
            host_descriptor().fields().to_vec(),
        ));
        let mut attrs = Map::new();
        attrs.insert("address".to_string(), Value::String("10.0.0.1".into()));
        let obj = service
            .create_object(&registry, host_descriptor(), FullName::new("h1"), &[], attrs)
            .unwrap();

        service.delete_object(&registry, &obj).unwrap();

        assert!(registry
            .lookup(&TypeName::new("Host"), &FullName::new("h1"))
            .is_none());
        let staged = tmp
            .path()
            .join("_api")
            .join(crate::paths::ACTIVE_STAGE)
            .join("conf.d")
            .join("hosts")
            .join("h1.conf");
        assert!(!staged.exists());
    }
}
