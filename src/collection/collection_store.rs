use super::{CollectionId, CollectionSpec};
use crate::path::ObjectPath;
use std::collections::BTreeMap;

/// Read access to authored collection specs.
pub trait CollectionStore {
    /// The spec authored for `id`, if any.
    fn collection(&self, id: &CollectionId) -> Option<CollectionSpec>;

    /// Resolves a collection path such as `/World.collection:geom` to its spec.
    fn resolve_target(&self, target: &ObjectPath) -> Option<CollectionSpec> {
        CollectionId::from_collection_path(target).and_then(|id| self.collection(&id))
    }
}

impl CollectionStore for BTreeMap<CollectionId, CollectionSpec> {
    fn collection(&self, id: &CollectionId) -> Option<CollectionSpec> {
        self.get(id).cloned()
    }
}
