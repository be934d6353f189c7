//! Zone tree and endpoint identity (spec §3 "Zone / endpoint / peer
//! listener", §4.7 authorization).
//!
//! Zones form a tree; each zone owns zero or more endpoints. Authorization
//! is expressed in terms of the tree shape alone -- a zone can access an
//! object belonging to itself or to any of its descendant zones, mirroring
//! the "parent may command a child, never vice-versa" rule in §4.7.

use std::collections::HashMap;

use meridian_types::{EndpointName, ZoneName};

use crate::error::{DirectoryError, Result};

struct ZoneRecord {
    parent: Option<ZoneName>,
    endpoints: Vec<EndpointName>,
}

/// The zone tree: registration, parent/child relationships, and
/// endpoint-to-zone lookup.
#[derive(Default)]
pub struct ZoneTree {
    zones: HashMap<ZoneName, ZoneRecord>,
}

impl ZoneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zone, optionally under `parent`. Fails if `parent` is
    /// itself unregistered (zones must be created root-first) or would
    /// create a cycle with an already-registered zone of the same name.
    pub fn register_zone(&mut self, name: ZoneName, parent: Option<ZoneName>) -> Result<()> {
        if self.zones.contains_key(&name) {
            return Err(DirectoryError::ZoneAlreadyRegistered(name));
        }
        if let Some(parent) = &parent {
            if !self.zones.contains_key(parent) {
                return Err(DirectoryError::UnknownZone(parent.clone()));
            }
            if parent == &name {
                return Err(DirectoryError::CyclicParent {
                    zone: name,
                    parent: parent.clone(),
                });
            }
        }
        self.zones.insert(
            name,
            ZoneRecord {
                parent,
                endpoints: Vec::new(),
            },
        );
        Ok(())
    }

    /// Assigns `endpoint` to `zone`'s endpoint list.
    pub fn add_endpoint(&mut self, zone: &ZoneName, endpoint: EndpointName) -> Result<()> {
        let record = self
            .zones
            .get_mut(zone)
            .ok_or_else(|| DirectoryError::UnknownZone(zone.clone()))?;
        if !record.endpoints.contains(&endpoint) {
            record.endpoints.push(endpoint);
        }
        Ok(())
    }

    pub fn endpoints_of(&self, zone: &ZoneName) -> &[EndpointName] {
        self.zones
            .get(zone)
            .map(|r| r.endpoints.as_slice())
            .unwrap_or(&[])
    }

    pub fn zone_of_endpoint(&self, endpoint: &EndpointName) -> Option<ZoneName> {
        self.zones
            .iter()
            .find(|(_, record)| record.endpoints.contains(endpoint))
            .map(|(name, _)| name.clone())
    }

    pub fn parent(&self, zone: &ZoneName) -> Option<ZoneName> {
        self.zones.get(zone)?.parent.clone()
    }

    pub fn zone_exists(&self, zone: &ZoneName) -> bool {
        self.zones.contains_key(zone)
    }

    /// True if `descendant` is `ancestor`, or is reachable from `ancestor`
    /// by following child links (i.e. `ancestor` appears in `descendant`'s
    /// parent chain).
    pub fn is_child_of(&self, descendant: &ZoneName, ancestor: &ZoneName) -> bool {
        let mut current = descendant.clone();
        loop {
            if &current == ancestor {
                return true;
            }
            match self.parent(&current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Spec §3/§4.7: a zone may access an object belonging to itself or to
    /// any descendant zone.
    pub fn can_access(&self, accessing_zone: &ZoneName, object_zone: &ZoneName) -> bool {
        accessing_zone == object_zone || self.is_child_of(object_zone, accessing_zone)
    }
}
