//! Identity/field indirection table.

use std::collections::BTreeMap;

use aboutdb_types::Location;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Field name to location for one identity.
pub type FieldMap = BTreeMap<String, Location>;

/// Authoritative mapping identity -> field -> [`Location`].
///
/// Writes are last-write-wins with no versioning. Deleting an identity drops
/// its whole field map in one step, so readers see either every field or
/// [`StoreError::NotFound`].
#[derive(Debug, Default)]
pub struct Register {
    objects: BTreeMap<String, FieldMap>,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the location for (identity, field).
    ///
    /// Returns the location that was replaced, if any.
    pub fn put(&mut self, identity: &str, field: &str, location: Location) -> Option<Location> {
        debug!(identity, field, ?location, "register put");
        self.objects
            .entry(identity.to_string())
            .or_default()
            .insert(field.to_string(), location)
    }

    /// All field locations for an identity.
    pub fn get(&self, identity: &str) -> StoreResult<&FieldMap> {
        self.objects
            .get(identity)
            .ok_or_else(|| StoreError::NotFound(identity.to_string()))
    }

    /// The location of a single field.
    pub fn get_field(&self, identity: &str, field: &str) -> StoreResult<&Location> {
        self.get(identity)?
            .get(field)
            .ok_or_else(|| StoreError::FieldNotFound {
                identity: identity.to_string(),
                field: field.to_string(),
            })
    }

    /// Remove every field of an identity and return them.
    pub fn delete(&mut self, identity: &str) -> StoreResult<FieldMap> {
        debug!(identity, "register delete");
        self.objects
            .remove(identity)
            .ok_or_else(|| StoreError::NotFound(identity.to_string()))
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.objects.contains_key(identity)
    }

    /// Number of live identities.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Live identities in sorted order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Every live (identity, fields) pair in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldMap)> {
        self.objects.iter().map(|(id, fields)| (id.as_str(), fields))
    }
}
