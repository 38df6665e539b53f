//! Resolution of nested collections into rule maps and expressions.

use super::{CollectionId, CollectionSpec, CollectionStore, FlattenedRuleMap, MembershipRule};
use crate::expr::{PathExpression, rule_map_to_expression};
use crate::path::ObjectPath;
use core::fmt::{Display, Formatter};

const LOG_TARGET: &str = "  resolver";

/// A collection that was reached again while it was still being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularReference {
    /// The active resolution path, ending with the repeated collection.
    pub chain: Vec<ObjectPath>,
}

impl Display for CircularReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let chain: Vec<&str> = self.chain.iter().map(ObjectPath::as_str).collect();
        write!(f, "circular reference {}", chain.join(" -> "))
    }
}

/// The collections on the active resolution path.
#[derive(Debug, Default)]
struct CycleGuard {
    active: Vec<CollectionId>,
}

impl CycleGuard {
    fn contains(&self, id: &CollectionId) -> bool {
        self.active.contains(id)
    }

    fn enter(&mut self, id: CollectionId) {
        self.active.push(id);
    }

    fn leave(&mut self) {
        let _ = self.active.pop();
    }

    fn cycle_to(&self, id: &CollectionId) -> CircularReference {
        let mut chain: Vec<ObjectPath> = self.active.iter().map(|active| active.collection_path().clone()).collect();
        chain.push(id.collection_path().clone());
        CircularReference { chain }
    }
}

/// What a resolution pass learned besides its result.
#[derive(Debug, Default)]
pub(crate) struct ResolutionReport {
    /// Nested collections that were entered, in resolution order.
    pub included_collections: Vec<ObjectPath>,
    pub circular_references: Vec<CircularReference>,
}

/// Resolves one collection, threading a single cycle guard through every
/// nested collection and expression reference it reaches.
pub(crate) struct Resolver<'a, C: ?Sized> {
    store: &'a C,
    guard: CycleGuard,
    report: ResolutionReport,
}

impl<'a, C: CollectionStore + ?Sized> Resolver<'a, C> {
    pub fn new(store: &'a C, root: &CollectionId) -> Self {
        let mut guard = CycleGuard::default();
        guard.enter(root.clone());
        Self {
            store,
            guard,
            report: ResolutionReport::default(),
        }
    }

    pub fn finish(self) -> ResolutionReport {
        self.report
    }

    /// Flattens the includes and excludes of `spec`, expanding nested collections.
    ///
    /// Entries are written in authored order, so a later include overrides an
    /// earlier one at the same path and every exclude overrides all includes.
    pub fn rule_map(&mut self, spec: &CollectionSpec) -> FlattenedRuleMap {
        let include = MembershipRule::Include(spec.effective_expansion_rule());
        let mut rule_map = FlattenedRuleMap::new();

        if spec.include_root {
            rule_map.insert(ObjectPath::root(), include);
        }

        for target in &spec.includes {
            let Some(target) = self.anchor(spec, target) else {
                continue;
            };

            match CollectionId::from_collection_path(&target) {
                Some(nested_id) => {
                    if let Some(nested) = self.enter(&nested_id) {
                        if nested.is_in_expression_mode() {
                            log::warn!(
                                target: LOG_TARGET,
                                "Collection '{nested_id}' uses a membership expression and contributes no rules to '{}'",
                                spec.id()
                            );
                        }

                        let nested_map = self.rule_map(&nested);
                        self.guard.leave();
                        rule_map.merge_from(nested_map);
                    }
                }
                None => rule_map.insert(target, include),
            }
        }

        for target in &spec.excludes {
            if let Some(target) = self.anchor(spec, target) {
                rule_map.insert(target, MembershipRule::Exclude);
            }
        }

        rule_map
    }

    /// The complete membership expression of `spec` with every reference substituted.
    ///
    /// Relationship-mode collections, whether the root or referenced, are
    /// converted from their rule maps.
    pub fn expression(&mut self, spec: &CollectionSpec) -> PathExpression {
        if !spec.is_in_expression_mode() {
            let rule_map = self.rule_map(spec);
            return rule_map_to_expression(&rule_map);
        }

        match spec.parsed_membership_expression() {
            Ok(expression) => self.substitute(&expression, spec.id().owner()),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Ignoring membership expression of collection '{}': {e}", spec.id());
                PathExpression::Nothing
            }
        }
    }

    /// Anchors each term at `anchor` and replaces references with their resolved expressions.
    ///
    /// A term that cannot be anchored becomes the empty expression; the rest of
    /// the expression is kept.
    fn substitute(&mut self, expression: &PathExpression, anchor: &ObjectPath) -> PathExpression {
        match expression {
            PathExpression::Reference(reference) => {
                let owner = match reference.owner().make_absolute(anchor) {
                    Ok(owner) => owner,
                    Err(e) => {
                        log::debug!(target: LOG_TARGET, "Dropping reference '{reference}': {e}");
                        return PathExpression::Nothing;
                    }
                };

                let Ok(nested_id) = CollectionId::new(owner, reference.name()) else {
                    log::debug!(target: LOG_TARGET, "Reference '{reference}' does not name a collection");
                    return PathExpression::Nothing;
                };

                let Some(nested) = self.enter(&nested_id) else {
                    return PathExpression::Nothing;
                };

                let resolved = self.expression(&nested);
                self.guard.leave();
                resolved
            }
            PathExpression::Pattern(pattern) => match pattern.make_absolute(anchor) {
                Ok(pattern) => PathExpression::Pattern(pattern),
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Dropping pattern '{pattern}': {e}");
                    PathExpression::Nothing
                }
            },
            PathExpression::Complement(operand) => PathExpression::complement(self.substitute(operand, anchor)),
            PathExpression::Binary { op, lhs, rhs } => {
                let lhs = self.substitute(lhs, anchor);
                let rhs = self.substitute(rhs, anchor);
                PathExpression::combine(*op, lhs, rhs)
            }
            PathExpression::Nothing => PathExpression::Nothing,
        }
    }

    /// Looks up a nested collection and pushes it on the guard.
    ///
    /// Returns `None`, leaving the guard untouched, for collections that are
    /// already being resolved and for targets the store does not know.
    fn enter(&mut self, id: &CollectionId) -> Option<CollectionSpec> {
        if self.guard.contains(id) {
            let cycle = self.guard.cycle_to(id);
            log::warn!(target: LOG_TARGET, "Eliding {cycle}");
            self.report.circular_references.push(cycle);
            return None;
        }

        let Some(nested) = self.store.resolve_target(id.collection_path()) else {
            log::debug!(target: LOG_TARGET, "Collection '{id}' does not resolve; it contributes nothing");
            return None;
        };

        let path = id.collection_path();
        if !self.report.included_collections.contains(path) {
            self.report.included_collections.push(path.clone());
        }

        self.guard.enter(id.clone());
        Some(nested)
    }

    fn anchor(&self, spec: &CollectionSpec, target: &ObjectPath) -> Option<ObjectPath> {
        match target.make_absolute(spec.id().owner()) {
            Ok(target) => Some(target),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Skipping target '{target}' of collection '{}': {e}", spec.id());
                None
            }
        }
    }
}

impl<C: ?Sized> core::fmt::Debug for Resolver<'_, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Resolver")
            .field("guard", &self.guard)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}
