//! Collections and their membership queries
//!
//! A collection is authored on a container as a [`CollectionSpec`]: either a
//! list of include and exclude targets governed by an [`ExpansionRule`], or a
//! membership expression. Include targets may name other collections, which
//! are expanded in place.
//!
//! # Implementation Model
//!
//! [`compute_membership_query`] resolves a spec once into an immutable
//! [`MembershipQuery`]:
//!
//! - In relationship mode the includes, excludes and nested collections are
//!   flattened into a [`FlattenedRuleMap`] holding at most one rule per path.
//!   Entries are written in authored order, so later includes override earlier
//!   ones at the same path and excludes override everything. Membership of a
//!   path is then decided by its nearest ancestor-or-self entry.
//!
//! - In expression mode the expression is anchored at the owning container and
//!   every collection reference in it is replaced by that collection's own
//!   resolved expression. Relationship-mode collections reached this way are
//!   converted with [`rule_map_to_expression`](crate::expr::rule_map_to_expression).
//!
//! Both paths share one resolver that keeps the collections currently being
//! resolved on a stack. A collection met again while on the stack contributes
//! nothing and the cycle is recorded; [`validate`] reports recorded cycles,
//! while query computation silently continues with the remaining targets.
//!
//! [`compute_included_objects`] enumerates the members of a query by walking
//! the object graph in path order, skipping subtrees that a rule map proves
//! empty.

mod collection_id;
mod collection_spec;
mod collection_store;
mod expansion_rule;
mod included_objects;
mod membership_query;
mod resolver;
mod rule_map;
mod validate;

pub use collection_id::{CollectionId, can_apply, is_collection_path, is_schema_property_base_name, schema_property_names};
pub use collection_spec::CollectionSpec;
pub use collection_store::CollectionStore;
pub use expansion_rule::ExpansionRule;
pub use included_objects::{compute_included_objects, compute_included_paths};
pub use membership_query::{MembershipQuery, compute_membership_query};
pub use resolver::CircularReference;
pub use rule_map::{FlattenedRuleMap, MembershipRule};
pub use validate::{ValidationOutcome, validate};

use crate::expr::PathExpression;

/// The complete membership expression of `spec`, with every collection
/// reference replaced by the referenced collection's resolved expression.
///
/// Circular references resolve to the empty expression and unresolvable ones
/// are dropped. A relationship-mode spec yields the expression equivalent of
/// its flattened rule map.
#[must_use]
pub fn resolve_complete_membership_expression<C: CollectionStore + ?Sized>(spec: &CollectionSpec, store: &C) -> PathExpression {
    let mut resolver = resolver::Resolver::new(store, spec.id());
    resolver.expression(spec)
}
