use super::resolver::Resolver;
use super::{CollectionSpec, CollectionStore, ExpansionRule, FlattenedRuleMap, MembershipRule};
use crate::Result;
use crate::expr::{ExpressionEvaluator, PathExpression, PathPattern, SetOperator, rule_map_to_expression};
use crate::graph::ObjectGraph;
use crate::path::ObjectPath;
use core::hash::{Hash, Hasher};
use ohno::bail;
use std::sync::Arc;

const LOG_TARGET: &str = "     query";

#[derive(Debug, Clone)]
enum Membership {
    RuleMap { rule_map: FlattenedRuleMap, include_root: bool },
    Expression(ExpressionEvaluator),
}

/// The computed membership of one collection.
///
/// A query is immutable and answers membership questions either from a
/// flattened rule map or from a resolved path expression. Queries compare
/// equal when their rule maps and root flags match, or when their expressions
/// are structurally identical; the list of included collections takes no part
/// in comparisons.
#[derive(Debug, Clone)]
pub struct MembershipQuery {
    membership: Membership,
    included_collections: Vec<ObjectPath>,
}

impl Default for MembershipQuery {
    fn default() -> Self {
        Self::from_rule_map(FlattenedRuleMap::new(), false)
    }
}

impl MembershipQuery {
    #[must_use]
    pub const fn from_rule_map(rule_map: FlattenedRuleMap, include_root: bool) -> Self {
        Self {
            membership: Membership::RuleMap { rule_map, include_root },
            included_collections: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_expression(expression: PathExpression, graph: Arc<dyn ObjectGraph>) -> Self {
        Self {
            membership: Membership::Expression(ExpressionEvaluator::new(expression, graph)),
            included_collections: Vec::new(),
        }
    }

    /// Whether `path` is a member.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is relative.
    pub fn is_included(&self, path: &ObjectPath) -> Result<bool> {
        if !path.is_absolute() {
            bail!("membership can only be queried for absolute paths, got '{path}'");
        }

        Ok(self.contains(path))
    }

    /// Membership of `path` during a top-down traversal, given the expansion
    /// rule in effect at its parent.
    ///
    /// Returns whether `path` is a member together with the rule to pass on
    /// when visiting its children. An entry at `path` overrides the parent
    /// rule; an excluded path hands down [`ExpansionRule::ExplicitOnly`], so
    /// that only deeper entries can bring its descendants back. For the root,
    /// pass [`ExpansionRule::ExplicitOnly`]. Expression queries ignore the
    /// parent rule and hand it down unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is relative.
    pub fn is_included_with_parent_rule(&self, path: &ObjectPath, parent_rule: ExpansionRule) -> Result<(bool, ExpansionRule)> {
        if !path.is_absolute() {
            bail!("membership can only be queried for absolute paths, got '{path}'");
        }

        let (rule_map, include_root) = match &self.membership {
            Membership::RuleMap { rule_map, include_root } => (rule_map, *include_root),
            Membership::Expression(evaluator) => return Ok((evaluator.matches(path), parent_rule)),
        };

        Ok(match rule_map.get(path) {
            Some(MembershipRule::Include(rule)) => (true, rule),
            Some(MembershipRule::Exclude) => (false, ExpansionRule::ExplicitOnly),
            None if path.is_root() => (include_root, ExpansionRule::ExplicitOnly),
            None => match parent_rule {
                ExpansionRule::ExplicitOnly => (false, parent_rule),
                ExpansionRule::ExpandContainers => (!path.is_property(), parent_rule),
                ExpansionRule::ExpandContainersAndProperties => (true, parent_rule),
            },
        })
    }

    /// Membership of a path already known to be absolute.
    pub(crate) fn contains(&self, path: &ObjectPath) -> bool {
        match &self.membership {
            Membership::RuleMap { rule_map, include_root } => rule_map.includes(path, *include_root),
            Membership::Expression(evaluator) => evaluator.matches(path),
        }
    }

    /// Whether nothing at or below `path` can be a member, judged from the rule map alone.
    pub(crate) fn excludes_subtree(&self, path: &ObjectPath) -> bool {
        match &self.membership {
            Membership::RuleMap { rule_map, .. } => {
                matches!(rule_map.governing_entry(path), Some((_, rule)) if !rule.is_include()) && !rule_map.has_entries_below(path)
            }
            Membership::Expression(_) => false,
        }
    }

    /// The nested collections that were resolved into this query, in resolution order.
    #[must_use]
    pub fn included_collections(&self) -> &[ObjectPath] {
        &self.included_collections
    }

    #[must_use]
    pub const fn uses_rule_map(&self) -> bool {
        matches!(self.membership, Membership::RuleMap { .. })
    }

    /// The flattened rules of a relationship-mode query.
    #[must_use]
    pub const fn rule_map(&self) -> Option<&FlattenedRuleMap> {
        match &self.membership {
            Membership::RuleMap { rule_map, .. } => Some(rule_map),
            Membership::Expression(_) => None,
        }
    }

    #[must_use]
    pub const fn include_root(&self) -> bool {
        matches!(self.membership, Membership::RuleMap { include_root: true, .. })
    }

    /// The resolved expression of an expression-mode query.
    #[must_use]
    pub const fn expression(&self) -> Option<&PathExpression> {
        match &self.membership {
            Membership::Expression(evaluator) => Some(evaluator.expression()),
            Membership::RuleMap { .. } => None,
        }
    }

    /// An expression that matches the same paths as this query.
    #[must_use]
    pub fn to_expression(&self) -> PathExpression {
        match &self.membership {
            Membership::RuleMap { rule_map, include_root } => {
                let expression = rule_map_to_expression(rule_map);
                let root = ObjectPath::root();
                if *include_root && rule_map.get(&root).is_none() {
                    return PathExpression::combine(SetOperator::ImpliedUnion, PathExpression::Pattern(PathPattern::exact(&root)), expression);
                }
                expression
            }
            Membership::Expression(evaluator) => evaluator.expression().clone(),
        }
    }
}

impl PartialEq for MembershipQuery {
    fn eq(&self, other: &Self) -> bool {
        match (&self.membership, &other.membership) {
            (
                Membership::RuleMap { rule_map, include_root },
                Membership::RuleMap {
                    rule_map: other_map,
                    include_root: other_root,
                },
            ) => include_root == other_root && rule_map == other_map,
            (Membership::Expression(evaluator), Membership::Expression(other_evaluator)) => {
                evaluator.expression() == other_evaluator.expression()
            }
            _ => false,
        }
    }
}

impl Eq for MembershipQuery {}

impl Hash for MembershipQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.membership {
            Membership::RuleMap { rule_map, include_root } => {
                0_u8.hash(state);
                rule_map.hash(state);
                include_root.hash(state);
            }
            Membership::Expression(evaluator) => {
                1_u8.hash(state);
                evaluator.expression().hash(state);
            }
        }
    }
}

/// Computes the membership query of `spec`.
///
/// Nested collections and expression references are looked up in `stage`.
/// Expression-mode queries keep a handle on `stage` so that pattern predicates
/// can read objects when membership is evaluated. Broken or circular
/// references never fail the computation; use [`validate`](super::validate)
/// to discover them.
#[must_use]
pub fn compute_membership_query<S>(spec: &CollectionSpec, stage: &Arc<S>) -> MembershipQuery
where
    S: ObjectGraph + CollectionStore + 'static,
{
    if !spec.is_in_expression_mode() {
        return compute_rule_map_query(spec, &**stage);
    }

    let mut resolver = Resolver::new(&**stage, spec.id());
    let expression = resolver.expression(spec);
    let report = resolver.finish();

    log::debug!(
        target: LOG_TARGET,
        "Computed expression query for '{}': '{expression}' from {} nested collection(s)",
        spec.id(),
        report.included_collections.len()
    );

    let graph: Arc<dyn ObjectGraph> = Arc::clone(stage) as Arc<dyn ObjectGraph>;
    let mut query = MembershipQuery::from_expression(expression, graph);
    query.included_collections = report.included_collections;
    query
}

/// Computes the relationship-mode query of `spec`, ignoring any expression.
pub(crate) fn compute_rule_map_query<C: CollectionStore + ?Sized>(spec: &CollectionSpec, store: &C) -> MembershipQuery {
    let mut resolver = Resolver::new(store, spec.id());
    let rule_map = resolver.rule_map(spec);
    let report = resolver.finish();

    log::debug!(
        target: LOG_TARGET,
        "Computed rule map query for '{}': {} entries from {} nested collection(s)",
        spec.id(),
        rule_map.len(),
        report.included_collections.len()
    );

    let mut query = MembershipQuery::from_rule_map(rule_map, spec.include_root);
    query.included_collections = report.included_collections;
    query
}
