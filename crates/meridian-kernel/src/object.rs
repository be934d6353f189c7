//! The configurable object: reflective fields, modification tracking, and
//! the activation lifecycle (spec §3, §4.1, §4.2).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use meridian_types::{AttributeClass, AttributePath, FullName, TypeName, Version};
use serde_json::Value;

use crate::activation::{DefaultLifecycle, Lifecycle, LifecycleFlags, LifecycleRecorder};
use crate::error::{KernelError, Result};
use crate::registry::{FieldKind, TypeDescriptor};
use crate::signal::{MessageOrigin, NameValidator, NullSignalBus, ObjectSignal, SignalBus, SignalEnvelope};

struct ObjectState {
    fields: Vec<Value>,
    version: Version,
    flags: LifecycleFlags,
    /// Dotted attribute path -> pre-modification value. Populated on first
    /// Config-class mutation of that exact path only.
    original_attributes: HashMap<String, Value>,
    extensions: HashMap<String, Value>,
}

/// Every replicated entity: a fully-qualified name, reflective fields,
/// modification tracking, and the activation lifecycle.
///
/// The monitor (an internal mutex) protects the field table, the
/// original-attributes map, and the lifecycle flags. `Activate`/
/// `Deactivate`/registry register/unregister assert the calling thread
/// does not already hold it, to avoid self-deadlock with signal dispatch
/// (spec §5).
pub struct ConfigurableObject {
    type_descriptor: Arc<TypeDescriptor>,
    full_name: FullName,
    lifecycle: Arc<dyn Lifecycle>,
    bus: Arc<dyn SignalBus>,
    validator: Option<Arc<dyn NameValidator>>,
    state: Mutex<ObjectState>,
    monitor_owner: Mutex<Option<ThreadId>>,
}

impl ConfigurableObject {
    pub fn new(type_descriptor: Arc<TypeDescriptor>, full_name: FullName) -> Self {
        let field_count = type_descriptor.fields().len();
        Self {
            type_descriptor,
            full_name,
            lifecycle: Arc::new(DefaultLifecycle),
            bus: Arc::new(NullSignalBus),
            validator: None,
            state: Mutex::new(ObjectState {
                fields: vec![Value::Null; field_count],
                version: Version::zero(),
                flags: LifecycleFlags::default(),
                original_attributes: HashMap::new(),
                extensions: HashMap::new(),
            }),
            monitor_owner: Mutex::new(None),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn Lifecycle>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_bus(mut self, bus: Arc<dyn SignalBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn NameValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_descriptor.name
    }

    /// Clone of the descriptor `Arc` this object was constructed with, for
    /// components (e.g. the serializer) that need the full field table.
    pub fn descriptor_handle(&self) -> Arc<TypeDescriptor> {
        self.type_descriptor.clone()
    }

    pub fn full_name(&self) -> &FullName {
        &self.full_name
    }

    pub fn version(&self) -> Version {
        self.with_state(|s| s.version)
    }

    pub fn is_active(&self) -> bool {
        self.with_state(|s| s.flags.active)
    }

    pub fn is_paused(&self) -> bool {
        self.with_state(|s| s.flags.paused)
    }

    pub fn flags(&self) -> LifecycleFlags {
        self.with_state(|s| s.flags)
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        let field_id = self.type_descriptor.field_id(name)?;
        Some(self.with_state(|s| s.fields[field_id.index()].clone()))
    }

    pub fn get_ext(&self, key: &str) -> Option<Value> {
        self.with_state(|s| s.extensions.get(key).cloned())
    }

    pub fn set_ext(&self, key: impl Into<String>, value: Value) {
        self.with_state(|s| {
            s.extensions.insert(key.into(), value);
        });
    }

    // ------------------------------------------------------------------
    // Monitor discipline
    // ------------------------------------------------------------------

    fn with_state<R>(&self, f: impl FnOnce(&mut ObjectState) -> R) -> R {
        *self.monitor_owner.lock().unwrap() = Some(thread::current().id());
        let mut guard = self.state.lock().unwrap();
        let result = f(&mut guard);
        drop(guard);
        *self.monitor_owner.lock().unwrap() = None;
        result
    }

    /// Precondition for `Activate`/`Deactivate`/registry register-unregister:
    /// the caller must not already hold this object's monitor.
    pub fn assert_not_owns_lock(&self) {
        let owner = *self.monitor_owner.lock().unwrap();
        assert_ne!(
            owner,
            Some(thread::current().id()),
            "object monitor already held by the calling thread"
        );
    }

    fn emit(&self, signal: ObjectSignal, origin: Option<MessageOrigin>) {
        self.bus.publish(SignalEnvelope {
            type_name: self.type_descriptor.name.clone(),
            full_name: self.full_name.clone(),
            signal,
            origin,
        });
    }

    // ------------------------------------------------------------------
    // C2: reflective field modification
    // ------------------------------------------------------------------

    /// Applies `value` at `path`. See spec §4.1 for the full step sequence.
    ///
    /// The read of the old value, the original-attributes tracking check,
    /// computing the new value (walking into nested maps), validating it,
    /// and committing it are all done inside a single `with_state` call, so
    /// the whole read-modify-write is atomic under the object's monitor
    /// (spec §5) -- two concurrent `modify_attribute` calls against
    /// different nested keys of the same parent field can't lose one of
    /// the two updates.
    pub fn modify_attribute(
        &self,
        path: &str,
        value: Value,
        origin: Option<MessageOrigin>,
    ) -> Result<()> {
        let attr_path = AttributePath::parse(path);
        let field_id = self
            .type_descriptor
            .field_id(attr_path.head())
            .ok_or_else(|| KernelError::UnknownField {
                type_name: self.type_descriptor.name.to_string(),
                field: attr_path.head().to_string(),
            })?;
        let descriptor = self.type_descriptor.field(field_id).clone();

        let newly_tracked = self.with_state(|s| -> Result<bool> {
            let old = s.fields[field_id.index()].clone();

            let mut newly_tracked = false;
            if descriptor.class.contains(AttributeClass::CONFIG) {
                let full_path = attr_path.as_str();
                if !s.original_attributes.contains_key(&full_path) {
                    s.original_attributes.insert(full_path, old.clone());
                    newly_tracked = true;
                }
            }

            let new_value = if !attr_path.is_nested() {
                value.clone()
            } else {
                let mut base = old;
                set_nested(&mut base, attr_path.tail(), value.clone(), path)?;
                base
            };

            if !attr_path.is_nested() {
                self.type_descriptor
                    .validate_value(field_id, &new_value)
                    .map_err(|reason| KernelError::InvalidArgument {
                        path: path.to_string(),
                        reason,
                    })?;
                if let FieldKind::NameRef(ref_type) = &descriptor.kind {
                    if let Some(validator) = &self.validator {
                        let name_str = new_value.as_str().unwrap_or_default();
                        if !validator.validate_name(ref_type, &FullName::new(name_str)) {
                            return Err(KernelError::InvalidArgument {
                                path: path.to_string(),
                                reason: format!("no {ref_type} named '{name_str}'"),
                            });
                        }
                    }
                }
            }

            s.fields[field_id.index()] = new_value;
            s.version = s.version.next();
            Ok(newly_tracked)
        })?;

        self.emit(
            ObjectSignal::FieldChanged {
                field: attr_path.head().to_string(),
            },
            origin.clone(),
        );
        if newly_tracked {
            self.emit(
                ObjectSignal::OriginalAttributesChanged {
                    path: attr_path.as_str(),
                },
                origin,
            );
        }
        Ok(())
    }

    /// Restores the top-level field named by `path`'s head token to the
    /// value recorded in `original-attributes`, if any.
    ///
    /// TODO(vars.os): this restores the *whole* top-level field, not the
    /// exact nested sub-path that was recorded -- a known limitation
    /// carried from the system this core replicates (spec §9). Fixing it
    /// would require the snapshot format to record per-path history.
    pub fn restore_attribute(&self, path: &str) -> bool {
        let attr_path = AttributePath::parse(path);
        let full_path = attr_path.as_str();
        let saved = self.with_state(|s| s.original_attributes.remove(&full_path));
        match saved {
            Some(value) => {
                let Some(field_id) = self.type_descriptor.field_id(attr_path.head()) else {
                    return false;
                };
                self.with_state(|s| {
                    s.fields[field_id.index()] = value;
                    s.version = s.version.next();
                });
                true
            }
            None => false,
        }
    }

    pub fn is_attribute_modified(&self, path: &str) -> bool {
        let attr_path = AttributePath::parse(path);
        self.with_state(|s| s.original_attributes.contains_key(&attr_path.as_str()))
    }

    // ------------------------------------------------------------------
    // C4 hook: applied after a restore from the snapshot file.
    // ------------------------------------------------------------------

    pub fn on_state_loaded(&self) {
        self.lifecycle.on_state_loaded(self);
        let loaded = self.with_state(|s| s.flags.state_loaded);
        assert!(
            loaded,
            "Lifecycle::on_state_loaded() override did not set state_loaded"
        );
    }

    // ------------------------------------------------------------------
    // C2: activation state machine (spec §4.2)
    // ------------------------------------------------------------------

    pub fn activate(&self, origin: Option<MessageOrigin>) {
        self.assert_not_owns_lock();
        let already_active = self.with_state(|s| s.flags.active);
        assert!(!already_active, "Activate() called on an already-active object");

        let already_started = self.with_state(|s| s.flags.start_called);
        if !already_started {
            self.lifecycle.start(self);
            let started = self.with_state(|s| s.flags.start_called);
            assert!(started, "Lifecycle::start() override did not set start_called");
        }

        self.with_state(|s| {
            s.flags.active = true;
            s.version = s.version.next();
        });
        self.emit(ObjectSignal::ActiveChanged { active: true }, origin.clone());

        self.set_authority(true, origin);
    }

    pub fn deactivate(&self, origin: Option<MessageOrigin>) {
        self.assert_not_owns_lock();

        self.set_authority(false, origin.clone());

        let was_active = self.with_state(|s| s.flags.active);
        if !was_active {
            return;
        }

        self.with_state(|s| {
            s.flags.active = false;
            s.version = s.version.next();
        });
        self.emit(ObjectSignal::ActiveChanged { active: false }, origin);

        self.lifecycle.stop(self);
        let stopped = self.with_state(|s| s.flags.stop_called);
        assert!(stopped, "Lifecycle::stop() override did not set stop_called");
    }

    /// Sets whether the local endpoint is responsible for this object.
    /// `paused` is the logical negation of authority (spec §3, §4.2).
    pub fn set_authority(&self, authority: bool, origin: Option<MessageOrigin>) {
        let paused = self.with_state(|s| s.flags.paused);
        if authority && paused {
            self.lifecycle.resume(self);
            let resumed = self.with_state(|s| s.flags.resume_called);
            assert!(resumed, "Lifecycle::resume() override did not set resume_called");
            self.with_state(|s| s.flags.paused = false);
            self.emit(ObjectSignal::PausedChanged { paused: false }, origin);
        } else if !authority && !paused {
            self.lifecycle.pause(self);
            let paused_flag = self.with_state(|s| s.flags.pause_called);
            assert!(paused_flag, "Lifecycle::pause() override did not set pause_called");
            self.with_state(|s| s.flags.paused = true);
            self.emit(ObjectSignal::PausedChanged { paused: true }, origin);
        }
        // Otherwise idempotent: already in the requested authority state.
    }
}

impl LifecycleRecorder for ConfigurableObject {
    fn mark_started(&self) {
        self.with_state(|s| s.flags.start_called = true);
    }
    fn mark_stopped(&self) {
        self.with_state(|s| s.flags.stop_called = true);
    }
    fn mark_paused(&self) {
        self.with_state(|s| s.flags.pause_called = true);
    }
    fn mark_resumed(&self) {
        self.with_state(|s| s.flags.resume_called = true);
    }
    fn mark_state_loaded(&self) {
        self.with_state(|s| s.flags.state_loaded = true);
    }
}

impl std::fmt::Debug for ConfigurableObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurableObject")
            .field("type", &self.type_descriptor.name)
            .field("name", &self.full_name)
            .field("flags", &self.flags())
            .field("version", &self.version())
            .finish()
    }
}

/// Walks `tokens` into `value`, creating empty mappings where missing, and
/// setting the deepest mapping's final key to `new_value`. Fails when an
/// intermediate value exists but is not itself a mapping (spec §4.1 step 4).
fn set_nested(value: &mut Value, tokens: &[String], new_value: Value, path_for_error: &str) -> Result<()> {
    if value.is_null() {
        *value = Value::Object(serde_json::Map::new());
    }
    let map = value.as_object_mut().ok_or_else(|| KernelError::InvalidArgument {
        path: path_for_error.to_string(),
        reason: format!("'{}' is not a mapping", tokens[0]),
    })?;
    if tokens.len() == 1 {
        map.insert(tokens[0].clone(), new_value);
        return Ok(());
    }
    let child = map
        .entry(tokens[0].clone())
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    set_nested(child, &tokens[1..], new_value, path_for_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FieldDescriptor, FieldKind, TypeDescriptor};
    use meridian_types::TypeName;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn host_descriptor() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::new(
            TypeName::new("Host"),
            "Hosts",
            vec![
                FieldDescriptor::new("vars", FieldKind::Object, AttributeClass::CONFIG),
                FieldDescriptor::new("address", FieldKind::String, AttributeClass::CONFIG),
            ],
        ))
    }

    /// Spec §8 scenario 1: nested modification.
    #[test]
    fn nested_modification_tracks_original_field_value() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        obj.modify_attribute("vars", Value::Object(serde_json::Map::new()), None)
            .unwrap();
        let version_after_init = obj.version();

        obj.modify_attribute("vars.os", Value::String("linux".into()), None)
            .unwrap();
        obj.modify_attribute("vars.os", Value::String("bsd".into()), None)
            .unwrap();

        assert_eq!(
            obj.get_field("vars").unwrap(),
            serde_json::json!({"os": "bsd"})
        );
        assert!(obj.is_attribute_modified("vars.os"));
        assert_eq!(obj.version().get(), version_after_init.get() + 2);
    }

    #[test]
    fn restore_attribute_resets_top_level_field() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        obj.modify_attribute("vars", Value::Object(serde_json::Map::new()), None)
            .unwrap();
        obj.modify_attribute("vars.os", Value::String("linux".into()), None)
            .unwrap();
        obj.modify_attribute("vars.os", Value::String("bsd".into()), None)
            .unwrap();

        assert!(obj.restore_attribute("vars.os"));
        assert_eq!(obj.get_field("vars").unwrap(), serde_json::json!({}));
        assert!(!obj.is_attribute_modified("vars.os"));
    }

    #[test]
    fn version_bumps_once_per_distinct_modify_call() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        let start = obj.version();
        for _ in 0..5 {
            obj.modify_attribute("address", Value::String("x".into()), None)
                .unwrap();
        }
        assert_eq!(obj.version().get(), start.get() + 5);
    }

    #[test]
    fn nested_modify_on_non_mapping_intermediate_is_invalid_argument() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        obj.modify_attribute("vars", Value::String("not-a-map".into()), None)
            .unwrap();
        let err = obj
            .modify_attribute("vars.os", Value::String("linux".into()), None)
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidArgument { .. }));
    }

    #[test]
    fn unknown_field_is_unknown_field_error() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        let err = obj
            .modify_attribute("nope", Value::from(1), None)
            .unwrap_err();
        assert!(matches!(err, KernelError::UnknownField { .. }));
    }

    struct FlagLifecycle {
        started: AtomicBool,
    }

    impl Lifecycle for FlagLifecycle {
        fn start(&self, recorder: &dyn LifecycleRecorder) {
            self.started.store(true, Ordering::SeqCst);
            recorder.mark_started();
        }
    }

    #[test]
    fn activate_calls_start_exactly_once() {
        let lifecycle = Arc::new(FlagLifecycle {
            started: AtomicBool::new(false),
        });
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"))
            .with_lifecycle(lifecycle.clone());

        obj.activate(None);
        assert!(lifecycle.started.load(Ordering::SeqCst));
        assert!(obj.is_active());
        assert!(!obj.is_paused());

        lifecycle.started.store(false, Ordering::SeqCst);
        obj.deactivate(None);
        obj.activate(None);
        assert!(
            !lifecycle.started.load(Ordering::SeqCst),
            "Start() must not run again on a second Activate()"
        );
    }

    #[test]
    #[should_panic(expected = "already-active")]
    fn activate_twice_without_deactivate_panics() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        obj.activate(None);
        obj.activate(None);
    }

    #[test]
    fn deactivate_on_inactive_object_is_a_silent_no_op() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        obj.deactivate(None);
        assert!(!obj.is_active());
    }

    #[test]
    fn set_authority_false_then_true_pauses_then_resumes() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        obj.activate(None);
        assert!(!obj.is_paused());

        obj.set_authority(false, None);
        assert!(obj.is_paused());
        assert!(obj.flags().pause_called);

        obj.set_authority(true, None);
        assert!(!obj.is_paused());
        assert!(obj.flags().resume_called);
    }

    #[test]
    fn on_state_loaded_sets_flag_exactly_once() {
        let obj = ConfigurableObject::new(host_descriptor(), FullName::new("h1"));
        assert!(!obj.flags().state_loaded);
        obj.on_state_loaded();
        assert!(obj.flags().state_loaded);
    }
}
