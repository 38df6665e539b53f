//! Collection membership over hierarchical object graphs
//!
//! A collection names a set of objects in a graph, either through include and
//! exclude targets with an expansion rule, or through a path expression. This
//! crate computes immutable membership queries from collection specs, answers
//! per-path membership, enumerates members, translates between the two
//! representations and validates specs.
//!
//! # Module Organization
//!
//! - [`path`]: Object paths and their hierarchy
//! - [`graph`]: The object graph interface and an in-memory stage
//! - [`collection`]: Collection specs, rule maps, queries, enumeration and validation
//! - [`expr`]: Path expressions: parsing, evaluation and translation from rule maps
//! - [`config`]: TOML scene documents that populate a stage

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod collection;
pub mod config;
pub mod expr;
pub mod graph;
pub mod path;

pub use crate::collection::{
    CollectionId, CollectionSpec, CollectionStore, ExpansionRule, FlattenedRuleMap, MembershipQuery, MembershipRule, ValidationOutcome,
    compute_included_objects, compute_included_paths, compute_membership_query, resolve_complete_membership_expression, validate,
};
pub use crate::expr::{PathExpression, rule_map_to_expression};
pub use crate::graph::{Object, ObjectGraph, ObjectKind, Stage};
pub use crate::path::ObjectPath;
