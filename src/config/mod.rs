//! Scene documents
//!
//! A scene document is a TOML file that declares containers, their leaf
//! properties and the collections authored on them. Loading one yields an
//! in-memory [`Stage`](crate::graph::Stage) that serves as both the object
//! graph and the collection store of a membership query.

mod scene_document;

pub use scene_document::{CollectionDecl, ObjectDecl, SceneDocument};
