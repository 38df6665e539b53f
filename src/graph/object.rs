use crate::path::ObjectPath;
use std::sync::Arc;
use strum::Display;

/// Whether an object can own children or is a terminal property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ObjectKind {
    Container,
    Property,
}

/// A node of the object graph, addressed by exactly one absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    path: ObjectPath,
    kind: ObjectKind,
    type_name: Option<Arc<str>>,
    model_kind: Option<Arc<str>>,
    instance_proxy: bool,
}

impl Object {
    #[must_use]
    pub const fn container(path: ObjectPath, type_name: Option<Arc<str>>, model_kind: Option<Arc<str>>, instance_proxy: bool) -> Self {
        Self {
            path,
            kind: ObjectKind::Container,
            type_name,
            model_kind,
            instance_proxy,
        }
    }

    /// A leaf property; it is an instance proxy whenever its owner is.
    #[must_use]
    pub const fn property(path: ObjectPath, instance_proxy: bool) -> Self {
        Self {
            path,
            kind: ObjectKind::Property,
            type_name: None,
            model_kind: None,
            instance_proxy,
        }
    }

    #[must_use]
    pub const fn path(&self) -> &ObjectPath {
        &self.path
    }

    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    #[must_use]
    pub fn is_container(&self) -> bool {
        self.kind == ObjectKind::Container
    }

    #[must_use]
    pub fn is_property(&self) -> bool {
        self.kind == ObjectKind::Property
    }

    /// The schema type of a container, such as `Mesh` or `Scope`.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// The model kind of a container, such as `component` or `group`.
    #[must_use]
    pub fn model_kind(&self) -> Option<&str> {
        self.model_kind.as_deref()
    }

    #[must_use]
    pub const fn is_instance_proxy(&self) -> bool {
        self.instance_proxy
    }
}
