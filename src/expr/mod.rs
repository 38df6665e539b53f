//! Path expressions
//!
//! An alternative to include/exclude rules: a collection can describe its
//! members with a set-algebraic expression over path patterns, such as
//! `/World/Geom//C* //{kind:component} - %/World:hidden`.
//!
//! # Implementation Model
//!
//! Text is tokenized and parsed by recursive descent into a [`PathExpression`]
//! tree. Operators from loosest to tightest are `+` (union), `-` (difference),
//! `&` (intersection), whitespace (implied union) and `~` (complement); all
//! binary operators associate to the left.
//!
//! Terms are either [`PathPattern`]s or references to another collection
//! (`%/Owner:name`). References are substituted by the collection resolver
//! before evaluation; any reference still present when an expression is
//! evaluated matches nothing.
//!
//! Patterns are matched segment by segment against the container names of a
//! candidate path, with `//` matching any number of intermediate containers.
//! Element predicates such as `{kind}` read the object through the
//! [`ObjectGraph`](crate::graph::ObjectGraph), so an [`ExpressionEvaluator`]
//! keeps a shared handle on the graph it was compiled against.
//!
//! [`rule_map_to_expression`] converts a flattened include/exclude rule map
//! into an expression that matches exactly the same paths.

mod evaluator;
mod parser;
mod path_expression;
mod path_pattern;
mod predicate;
mod translate;

pub use evaluator::ExpressionEvaluator;
pub use path_expression::{ExpressionReference, PathExpression, SetOperator};
pub use path_pattern::PathPattern;
pub use predicate::{ObjectPredicate, PredicateCall};
pub use translate::rule_map_to_expression;
