//! C3: converts objects to/from a self-describing value tree, filtered by
//! an attribute-class mask (spec §4.3).

use meridian_types::AttributeClass;
use serde_json::{Map, Value};

use crate::error::{KernelError, Result};
use crate::object::ConfigurableObject;
use crate::signal::MessageOrigin;

/// Produces a mapping from field name to value, including only fields
/// whose attribute-class bitmask intersects `mask`.
pub fn serialize(obj: &ConfigurableObject, mask: AttributeClass) -> Map<String, Value> {
    let descriptor = obj_type_descriptor(obj);
    let mut out = Map::new();
    for field in descriptor.fields() {
        if !field.class.intersects(mask) {
            continue;
        }
        if let Some(value) = obj.get_field(&field.name) {
            if !value.is_null() {
                out.insert(field.name.clone(), value);
            }
        }
    }
    out
}

/// Applies the inverse of [`serialize`]. When `safe` is true the input is
/// treated as untrusted: fields the type descriptor does not recognize are
/// dropped silently rather than raising. When `safe` is false an unknown
/// field is an error -- the caller is expected to have produced the tree
/// itself (e.g. round-tripping a local dump).
///
/// `origin` is threaded through to every `ModifyAttribute` call exactly as
/// the caller supplies it. Passing the inbound message's origin here is
/// what lets the outbound relay (`meridian-cluster`) recognize the
/// resulting signal as a reapplication of a peer's change rather than a
/// new local mutation, and skip re-relaying it (spec §4.7, §9).
pub fn deserialize(
    obj: &ConfigurableObject,
    tree: &Map<String, Value>,
    safe: bool,
    mask: AttributeClass,
    origin: Option<MessageOrigin>,
) -> Result<()> {
    let descriptor = obj_type_descriptor(obj);
    for (name, value) in tree {
        let Some(field_id) = descriptor.field_id(name) else {
            if safe {
                continue;
            }
            return Err(KernelError::UnexpectedField {
                type_name: descriptor.name.to_string(),
                field: name.clone(),
            });
        };
        let field = descriptor.field(field_id);
        if !field.class.intersects(mask) {
            continue;
        }
        if safe && descriptor.validate_value(field_id, value).is_err() {
            continue;
        }
        obj.modify_attribute(name, value.clone(), origin.clone())?;
    }
    Ok(())
}

fn obj_type_descriptor(obj: &ConfigurableObject) -> std::sync::Arc<crate::registry::TypeDescriptor> {
    // `ConfigurableObject` does not expose its descriptor directly (it is
    // owned privately alongside the field table); re-deriving it through
    // the one field lookup the public API exposes would be wasteful, so
    // the object hands back a clone of the `Arc` it already holds.
    obj.descriptor_handle()
}
