use crate::Result;
use crate::path::{ObjectPath, is_property_name};
use core::fmt::{Display, Formatter};
use ohno::bail;
use std::sync::Arc;

const COLLECTION_NAMESPACE: &str = "collection";

/// Base names of the properties that make up one collection instance.
const SCHEMA_PROPERTY_BASE_NAMES: [&str; 5] = ["expansionRule", "includeRoot", "includes", "excludes", "membershipExpression"];

/// The identity of a collection: the container that owns it plus its instance name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId {
    owner: ObjectPath,
    name: Arc<str>,
    path: ObjectPath,
}

impl CollectionId {
    /// # Errors
    ///
    /// Returns an error if `owner` is not an absolute container path or `name`
    /// is empty or not valid property-name text.
    pub fn new(owner: ObjectPath, name: &str) -> Result<Self> {
        if !owner.is_absolute() || owner.is_property() || owner.is_root() {
            bail!("collection owner '{owner}' must be an absolute, non-root container path");
        }

        if name.is_empty() {
            bail!("collection instance name on '{owner}' must not be empty");
        }

        if !is_property_name(name) {
            bail!("invalid collection instance name '{name}' on '{owner}'");
        }

        let path = owner.append_property(&format!("{COLLECTION_NAMESPACE}:{name}"))?;
        Ok(Self {
            owner,
            name: Arc::from(name),
            path,
        })
    }

    /// Recovers the identity from a path of the form `<owner>.collection:<name>`.
    #[must_use]
    pub fn from_collection_path(path: &ObjectPath) -> Option<Self> {
        if !is_collection_path(path) {
            return None;
        }

        let instance = path.property_name()?.strip_prefix(COLLECTION_NAMESPACE)?.strip_prefix(':')?;
        Self::new(path.prim_path(), instance).ok()
    }

    #[must_use]
    pub const fn owner(&self) -> &ObjectPath {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path that addresses this collection, `<owner>.collection:<name>`.
    #[must_use]
    pub const fn collection_path(&self) -> &ObjectPath {
        &self.path
    }
}

impl Display for CollectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Display::fmt(&self.path, f)
    }
}

/// Whether `path` addresses a collection rather than one of its schema properties.
#[must_use]
pub fn is_collection_path(path: &ObjectPath) -> bool {
    if !path.is_absolute() {
        return false;
    }

    let Some(instance) = path
        .property_name()
        .and_then(|name| name.strip_prefix(COLLECTION_NAMESPACE))
        .and_then(|rest| rest.strip_prefix(':'))
    else {
        return false;
    };

    let base = instance.rsplit(':').next().unwrap_or_default();
    !instance.is_empty() && !is_schema_property_base_name(base)
}

/// Whether a collection with this instance name can be applied.
///
/// # Errors
///
/// Returns an error if `name` is empty.
pub fn can_apply(name: &str) -> Result<bool> {
    if name.is_empty() {
        bail!("collection instance name must not be empty");
    }

    let base = name.rsplit(':').next().unwrap_or_default();
    Ok(is_property_name(name) && !is_schema_property_base_name(base))
}

/// The names of the properties that make up the collection `instance_name`.
#[must_use]
pub fn schema_property_names(instance_name: &str) -> Vec<String> {
    let mut names: Vec<String> = ["expansionRule", "includeRoot", "membershipExpression"]
        .iter()
        .map(|base| format!("{COLLECTION_NAMESPACE}:{instance_name}:{base}"))
        .collect();
    names.push(format!("{COLLECTION_NAMESPACE}:{instance_name}"));
    names
}

/// Whether `name` is the base name of a collection schema property. The empty
/// name counts, since it denotes the collection property itself.
#[must_use]
pub fn is_schema_property_base_name(name: &str) -> bool {
    name.is_empty() || SCHEMA_PROPERTY_BASE_NAMES.contains(&name)
}
