//! Hierarchical object paths
//!
//! Every object in the graph is addressed by exactly one absolute [`ObjectPath`].
//! Containers use `/`-separated identifiers and leaf properties hang off their
//! owning container with a `.` (`/World/Geom.visibility`). Relative paths are
//! accepted by the parser so that expressions can be written relative to the
//! object that owns them.

mod object_path;

pub use object_path::ObjectPath;
pub(crate) use object_path::{is_identifier, is_property_name};
