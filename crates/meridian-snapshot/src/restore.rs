//! Read path (spec §4.4): `RestoreObjects`.
//!
//! Records are enqueued onto a bounded, blocking queue; `config.concurrency`
//! worker threads drain it in parallel. A `std::sync::mpsc::sync_channel`
//! gives the required backpressure directly -- enqueue blocks the reading
//! thread once the queue is full (spec §5) -- which a non-blocking queue
//! (e.g. `crossbeam_queue::ArrayQueue`, commonly used for busy-signal
//! semantics instead of backpressure) does not provide.

use std::collections::HashSet;
use std::path::Path;
use std::sync::mpsc::sync_channel;
use std::sync::Mutex;

use meridian_kernel::{serializer, TypeRegistry};
use meridian_types::{AttributeClass, FullName, TypeName};
use tracing::{debug, warn};

use crate::config::SnapshotConfig;
use crate::error::{Result, SnapshotError};
use crate::framing::NetStringReader;

#[derive(Debug, Clone)]
struct Record {
    type_name: TypeName,
    full_name: FullName,
    update: serde_json::Map<String, serde_json::Value>,
}

fn parse_record(payload: &[u8]) -> Option<Record> {
    let value: serde_json::Value = match serde_json::from_slice(payload) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "malformed snapshot record, skipping");
            return None;
        }
    };
    let type_name = value.get("type")?.as_str()?;
    let full_name = value.get("name")?.as_str()?;
    let update = value.get("update")?.as_object()?.clone();
    Some(Record {
        type_name: TypeName::new(type_name),
        full_name: FullName::new(full_name),
        update,
    })
}

/// Reads `path` and applies each record to the matching registered object.
///
/// An unreadable file aborts restoration entirely (fatal at startup);
/// malformed or unresolvable individual records are logged and skipped.
/// Every object in `registry`, touched by the snapshot or not, receives
/// exactly one `on_state_loaded()` call before this returns.
pub fn restore_objects(
    path: &Path,
    registry: &TypeRegistry,
    mask: AttributeClass,
    config: &SnapshotConfig,
) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let touched: Mutex<HashSet<(TypeName, FullName)>> = Mutex::new(HashSet::new());
    let (tx, rx) = sync_channel::<Record>(config.queue_capacity);
    let rx = Mutex::new(rx);

    std::thread::scope(|scope| {
        for _ in 0..config.concurrency {
            let rx = &rx;
            let touched = &touched;
            scope.spawn(move || loop {
                let record = {
                    let rx = rx.lock().unwrap();
                    rx.recv()
                };
                let Ok(record) = record else { break };
                apply_record(registry, mask, record, touched);
            });
        }

        for payload in NetStringReader::new(&bytes) {
            let Some(record) = parse_record(payload) else {
                continue;
            };
            // Blocks once `config.queue_capacity` records are in flight.
            let _ = tx.send(record);
        }
        drop(tx);
    });

    let touched = touched.into_inner().unwrap();
    let mut finalized = 0usize;
    for obj in registry.all_objects() {
        if !touched.contains(&(obj.type_name().clone(), obj.full_name().clone())) {
            obj.on_state_loaded();
            finalized += 1;
        }
    }
    debug!(
        touched = touched.len(),
        finalized_untouched = finalized,
        path = %path.display(),
        "snapshot restored"
    );
    Ok(())
}

fn apply_record(
    registry: &TypeRegistry,
    mask: AttributeClass,
    record: Record,
    touched: &Mutex<HashSet<(TypeName, FullName)>>,
) {
    let Some(obj) = registry.lookup(&record.type_name, &record.full_name) else {
        debug!(
            type_name = %record.type_name,
            name = %record.full_name,
            "stale snapshot record: no such object, skipping"
        );
        return;
    };
    assert!(
        !obj.is_active(),
        "RestoreObjects record applied to an already-active object"
    );

    if let Err(e) = serializer::deserialize(&obj, &record.update, true, mask, None) {
        warn!(
            type_name = %record.type_name,
            name = %record.full_name,
            error = %e,
            "snapshot record rejected, skipping"
        );
    }
    obj.on_state_loaded();
    touched
        .lock()
        .unwrap()
        .insert((record.type_name, record.full_name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::dump_objects;
    use meridian_kernel::registry::{FieldDescriptor, FieldKind, TypeDescriptor};
    use meridian_kernel::ConfigurableObject;
    use meridian_types::FullName as FName;
    use std::sync::Arc;

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

    /// Spec §8 scenario 3: snapshot round-trip.
    #[test]
    fn restore_applies_dumped_fields_and_marks_state_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.dat");

        let write_registry = TypeRegistry::new();
        write_registry.register_type(host_descriptor());
        let descriptor = write_registry.type_descriptor(&TypeName::new("Host")).unwrap();
        let obj = Arc::new(ConfigurableObject::new(descriptor, FName::new("h1")));
        obj.modify_attribute("address", serde_json::Value::String("10.0.0.1".into()), None)
            .unwrap();
        write_registry.register_object(obj).unwrap();
        dump_objects(&path, &write_registry, AttributeClass::CONFIG).unwrap();

        let read_registry = TypeRegistry::new();
        read_registry.register_type(host_descriptor());
        let descriptor = read_registry.type_descriptor(&TypeName::new("Host")).unwrap();
        let restored = Arc::new(ConfigurableObject::new(descriptor, FName::new("h1")));
        read_registry.register_object(restored.clone()).unwrap();

        let config = SnapshotConfig::new(2);
        restore_objects(&path, &read_registry, AttributeClass::CONFIG, &config).unwrap();

        assert_eq!(
            restored.get_field("address"),
            Some(serde_json::Value::String("10.0.0.1".into()))
        );
        assert!(restored.flags().state_loaded);
    }

    #[test]
    fn restore_calls_on_state_loaded_on_objects_absent_from_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.dat");
        std::fs::write(&path, b"").unwrap();

        let registry = TypeRegistry::new();
        registry.register_type(host_descriptor());
        let descriptor = registry.type_descriptor(&TypeName::new("Host")).unwrap();
        let untouched = Arc::new(ConfigurableObject::new(descriptor, FName::new("h-untouched")));
        registry.register_object(untouched.clone()).unwrap();

        let config = SnapshotConfig::new(2);
        restore_objects(&path, &registry, AttributeClass::ALL, &config).unwrap();

        assert!(untouched.flags().state_loaded);
    }

    #[test]
    fn restore_skips_records_for_unknown_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.dat");
        let mut buf = Vec::new();
        crate::framing::encode_record(
            &mut buf,
            br#"{"type":"Host","name":"ghost","update":{"address":"x"}}"#,
        );
        std::fs::write(&path, &buf).unwrap();

        let registry = TypeRegistry::new();
        registry.register_type(host_descriptor());

        let config = SnapshotConfig::new(1);
        assert!(restore_objects(&path, &registry, AttributeClass::ALL, &config).is_ok());
    }

    #[test]
    fn restore_of_unreadable_file_is_fatal() {
        let registry = TypeRegistry::new();
        let config = SnapshotConfig::default();
        let err = restore_objects(
            Path::new("/nonexistent/path/snapshot.dat"),
            &registry,
            AttributeClass::ALL,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
