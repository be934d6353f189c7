//! Tracks which zone owns each registered object, so [`crate::ZoneTree`]'s
//! tree-shape authorization can be applied per object (spec §3's
//! `CanAccessObject(obj)`, §4.7 and §4.7's stricter `ExecuteCommand` check).

use std::collections::HashMap;

use meridian_types::{FullName, TypeName, ZoneName};

use crate::zone::ZoneTree;

/// Maps `(type, name)` to the zone that owns the object, i.e. the zone
/// with authority to mutate it locally.
#[derive(Default)]
pub struct ObjectZoneIndex {
    owners: HashMap<(TypeName, FullName), ZoneName>,
}

impl ObjectZoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_owner(&mut self, type_name: TypeName, full_name: FullName, zone: ZoneName) {
        self.owners.insert((type_name, full_name), zone);
    }

    pub fn remove(&mut self, type_name: &TypeName, full_name: &FullName) {
        self.owners.remove(&(type_name.clone(), full_name.clone()));
    }

    pub fn owner_of(&self, type_name: &TypeName, full_name: &FullName) -> Option<&ZoneName> {
        self.owners.get(&(type_name.clone(), full_name.clone()))
    }

    /// Spec §4.7: `origin.zone.CanAccessObject(target)`. Unknown objects
    /// are unauthorized by construction -- the dispatcher has already
    /// returned before reaching this check in that case, but a caller
    /// probing directly gets a safe default.
    pub fn can_access_object(
        &self,
        zones: &ZoneTree,
        accessing_zone: &ZoneName,
        type_name: &TypeName,
        full_name: &FullName,
    ) -> bool {
        match self.owner_of(type_name, full_name) {
            Some(owner) => zones.can_access(accessing_zone, owner),
            None => false,
        }
    }
}
