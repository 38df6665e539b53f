use super::{Object, ObjectGraph};
use crate::Result;
use crate::collection::{CollectionId, CollectionSpec, CollectionStore};
use crate::path::ObjectPath;
use ohno::bail;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct ContainerRecord {
    type_name: Option<Arc<str>>,
    model_kind: Option<Arc<str>>,
    instance_proxy: bool,
    properties: BTreeSet<ObjectPath>,
    children: BTreeSet<ObjectPath>,
}

/// An in-memory object graph together with the collections authored on it.
#[derive(Debug, Clone)]
pub struct Stage {
    containers: BTreeMap<ObjectPath, ContainerRecord>,
    collections: BTreeMap<CollectionId, CollectionSpec>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// An empty stage holding only the root container.
    #[must_use]
    pub fn new() -> Self {
        let mut containers = BTreeMap::new();
        let _ = containers.insert(ObjectPath::root(), ContainerRecord::default());
        Self {
            containers,
            collections: BTreeMap::new(),
        }
    }

    /// Defines a container and any missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is relative or addresses a property.
    pub fn define_container(&mut self, path: &ObjectPath) -> Result<()> {
        if !path.is_absolute() || path.is_property() {
            bail!("cannot define container at '{path}': expected an absolute container path");
        }

        let mut lineage: Vec<ObjectPath> = path.ancestors_inclusive().collect();
        lineage.reverse();

        for pair in lineage.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            let _ = self.containers.entry(child.clone()).or_default();
            if let Some(record) = self.containers.get_mut(parent) {
                let _ = record.children.insert(child.clone());
            }
        }

        Ok(())
    }

    /// Adds a leaf property to an existing container and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist or `name` is not a valid property name.
    pub fn add_property(&mut self, container: &ObjectPath, name: &str) -> Result<ObjectPath> {
        let property = container.append_property(name)?;
        let record = self.record_mut(container)?;
        let _ = record.properties.insert(property.clone());
        Ok(property)
    }

    /// Sets the schema type name of an existing container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist.
    pub fn set_type_name(&mut self, container: &ObjectPath, type_name: &str) -> Result<()> {
        self.record_mut(container)?.type_name = Some(Arc::from(type_name));
        Ok(())
    }

    /// Sets the model kind of an existing container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist.
    pub fn set_model_kind(&mut self, container: &ObjectPath, kind: &str) -> Result<()> {
        self.record_mut(container)?.model_kind = Some(Arc::from(kind));
        Ok(())
    }

    /// Flags a container as an instance proxy. Containers below it are proxies as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist.
    pub fn set_instance_proxy(&mut self, container: &ObjectPath, instance_proxy: bool) -> Result<()> {
        self.record_mut(container)?.instance_proxy = instance_proxy;
        Ok(())
    }

    /// Stores a collection spec on its owning container, replacing any spec with the same identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the owning container does not exist.
    pub fn set_collection(&mut self, spec: CollectionSpec) -> Result<Option<CollectionSpec>> {
        let owner = spec.id().owner();
        if !self.containers.contains_key(owner) {
            bail!("cannot author collection '{}': no container at '{owner}'", spec.id());
        }

        Ok(self.collections.insert(spec.id().clone(), spec))
    }

    pub fn remove_collection(&mut self, id: &CollectionId) -> Option<CollectionSpec> {
        self.collections.remove(id)
    }

    #[must_use]
    pub fn collection_spec(&self, id: &CollectionId) -> Option<&CollectionSpec> {
        self.collections.get(id)
    }

    /// All collections authored on `owner`, ordered by instance name.
    pub fn collections_on<'a>(&'a self, owner: &'a ObjectPath) -> impl Iterator<Item = &'a CollectionSpec> {
        self.collections.values().filter(move |spec| spec.id().owner() == owner)
    }

    fn record_mut(&mut self, container: &ObjectPath) -> Result<&mut ContainerRecord> {
        match self.containers.get_mut(container) {
            Some(record) => Ok(record),
            None => bail!("no container at '{container}'"),
        }
    }

    /// Whether `path` or one of its ancestors was flagged as an instance proxy.
    fn is_under_instance_proxy(&self, path: &ObjectPath) -> bool {
        path.prim_path()
            .ancestors_inclusive()
            .any(|ancestor| self.containers.get(&ancestor).is_some_and(|record| record.instance_proxy))
    }

    fn container_object(&self, path: &ObjectPath, record: &ContainerRecord) -> Object {
        Object::container(
            path.clone(),
            record.type_name.clone(),
            record.model_kind.clone(),
            self.is_under_instance_proxy(path),
        )
    }
}

impl ObjectGraph for Stage {
    fn object(&self, path: &ObjectPath) -> Option<Object> {
        if path.is_property() {
            let record = self.containers.get(&path.prim_path())?;
            return record
                .properties
                .contains(path)
                .then(|| Object::property(path.clone(), self.is_under_instance_proxy(path)));
        }

        self.containers.get(path).map(|record| self.container_object(path, record))
    }

    fn children(&self, path: &ObjectPath) -> Vec<Object> {
        self.containers.get(path).map_or_else(Vec::new, |record| {
            record
                .children
                .iter()
                .filter_map(|child| self.containers.get(child).map(|child_record| self.container_object(child, child_record)))
                .collect()
        })
    }

    fn properties(&self, path: &ObjectPath) -> Vec<Object> {
        let instance_proxy = self.is_under_instance_proxy(path);
        self.containers.get(path).map_or_else(Vec::new, |record| {
            record
                .properties
                .iter()
                .map(|property| Object::property(property.clone(), instance_proxy))
                .collect()
        })
    }
}

impl CollectionStore for Stage {
    fn collection(&self, id: &CollectionId) -> Option<CollectionSpec> {
        self.collections.get(id).cloned()
    }
}
