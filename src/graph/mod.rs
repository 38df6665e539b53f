//! The object graph that collections are evaluated against
//!
//! Membership queries only ever read the graph, through the [`ObjectGraph`]
//! trait: path lookup, per-container child and property enumeration, and a
//! whole-graph traversal built on top of those. [`Stage`] is the in-memory
//! implementation used by scene documents and tests. It also stores the
//! collection specs authored on its containers.
//!
//! # Implementation Model
//!
//! Containers are kept in a `BTreeMap` keyed by path. Because every element
//! character sorts after `/` and `.` sorts before `/`, a pre-order walk that
//! visits a container, then its properties, then its children yields objects
//! in ascending path order. Enumeration relies on this to be deterministic.

mod object;
mod object_graph;
mod stage;

pub use object::{Object, ObjectKind};
pub use object_graph::ObjectGraph;
pub use stage::Stage;
