//! Write path (spec §4.4): `DumpObjects`.

use std::path::Path;

use meridian_kernel::{serializer, TypeRegistry};
use meridian_types::AttributeClass;
use serde_json::json;
use tracing::debug;

use crate::error::{Result, SnapshotError};
use crate::framing::encode_record;

/// Serializes every object in `registry` whose mask-filtered field set is
/// non-empty, and writes them as net-string records to `path`.
///
/// The file is written to `path` with a `.tmp` suffix and renamed over the
/// final path on success, so a reader never observes a partially written
/// snapshot.
pub fn dump_objects(path: &Path, registry: &TypeRegistry, mask: AttributeClass) -> Result<()> {
    let mut buf = Vec::new();
    let mut record_count = 0usize;

    for obj in registry.all_objects() {
        let fields = serializer::serialize(&obj, mask);
        if fields.is_empty() {
            continue;
        }
        let record = json!({
            "type": obj.type_name().as_str(),
            "name": obj.full_name().as_str(),
            "update": fields,
        });
        encode_record(&mut buf, record.to_string().as_bytes());
        record_count += 1;
    }

    let temp_path = temp_path_for(path);
    std::fs::write(&temp_path, &buf).map_err(|source| SnapshotError::Io {
        path: temp_path.clone(),
        source,
    })?;
    std::fs::rename(&temp_path, path).map_err(|source| SnapshotError::Rename {
        temp_path: temp_path.clone(),
        path: path.to_path_buf(),
        source,
    })?;

    debug!(records = record_count, path = %path.display(), "snapshot dumped");
    Ok(())
}

fn temp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    std::path::PathBuf::from(name)
}
