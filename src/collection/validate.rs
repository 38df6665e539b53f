use super::resolver::Resolver;
use super::{CollectionSpec, CollectionStore, ExpansionRule};
use crate::expr::PathExpression;
use crate::path::ObjectPath;
use ohno::AppError;

const LOG_TARGET: &str = " validator";

/// The outcome of validating a collection spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,

    /// Every problem found, separated by `"; "`. Empty when the spec is valid.
    pub reason: String,
}

impl ValidationOutcome {
    #[must_use]
    pub const fn new(valid: bool, reason: String) -> Self {
        Self { valid, reason }
    }
}

/// Checks a spec for authoring problems.
///
/// Reports excludes combined with the `explicitOnly` rule, an expression
/// authored next to relationship rules, an expression that does not parse or
/// has relative terms climbing above the root, and circular references found
/// by a full resolution pass. None of these stop a query from being computed.
#[must_use]
pub fn validate<C: CollectionStore + ?Sized>(spec: &CollectionSpec, store: &C) -> ValidationOutcome {
    let mut reasons = Vec::new();

    if spec.effective_expansion_rule() == ExpansionRule::ExplicitOnly && !spec.excludes.is_empty() {
        reasons.push(format!(
            "Found excludes on collection '{}' whose expansion rule is '{}'",
            spec.id(),
            ExpansionRule::ExplicitOnly
        ));
    }

    if spec.has_membership_expression() && (spec.is_in_relationships_mode() || spec.expansion_rule.is_some()) {
        reasons.push(format!(
            "Collection '{}' authors a membership expression together with relationship rules",
            spec.id()
        ));
    }

    match spec.parsed_membership_expression() {
        Ok(expression) => {
            for (term, e) in unanchored_terms(&expression, spec.id().owner()) {
                reasons.push(format!(
                    "Term '{term}' in the membership expression of collection '{}' cannot be anchored: {e}",
                    spec.id()
                ));
            }
        }
        Err(e) => reasons.push(format!("Membership expression of collection '{}' does not parse: {e}", spec.id())),
    }

    let mut resolver = Resolver::new(store, spec.id());
    if spec.is_in_expression_mode() {
        let _ = resolver.expression(spec);
    } else {
        let _ = resolver.rule_map(spec);
    }

    for cycle in resolver.finish().circular_references {
        reasons.push(format!("Found {cycle} while resolving collection '{}'", spec.id()));
    }

    if !reasons.is_empty() {
        log::debug!(target: LOG_TARGET, "Collection '{}' is invalid: {}", spec.id(), reasons.join("; "));
    }

    ValidationOutcome::new(reasons.is_empty(), reasons.join("; "))
}

/// Every relative pattern or reference in `expression` that climbs above the root at `anchor`.
fn unanchored_terms(expression: &PathExpression, anchor: &ObjectPath) -> Vec<(String, AppError)> {
    match expression {
        PathExpression::Nothing => Vec::new(),
        PathExpression::Pattern(pattern) => pattern.make_absolute(anchor).err().map(|e| (pattern.to_string(), e)).into_iter().collect(),
        PathExpression::Reference(reference) => reference
            .owner()
            .make_absolute(anchor)
            .err()
            .map(|e| (reference.to_string(), e))
            .into_iter()
            .collect(),
        PathExpression::Complement(operand) => unanchored_terms(operand, anchor),
        PathExpression::Binary { lhs, rhs, .. } => {
            let mut terms = unanchored_terms(lhs, anchor);
            terms.extend(unanchored_terms(rhs, anchor));
            terms
        }
    }
}
