use super::{PathExpression, SetOperator};
use crate::graph::ObjectGraph;
use crate::path::ObjectPath;
use core::fmt::{Debug, Formatter};
use std::sync::Arc;

impl PathExpression {
    /// Whether an absolute path is a member of this expression's set.
    ///
    /// References that were never resolved match nothing, as do relative patterns.
    #[must_use]
    pub fn matches(&self, path: &ObjectPath, graph: &dyn ObjectGraph) -> bool {
        match self {
            Self::Nothing | Self::Reference(_) => false,
            Self::Pattern(pattern) => pattern.matches(path, graph),
            Self::Complement(operand) => !operand.matches(path, graph),
            Self::Binary { op, lhs, rhs } => match op {
                SetOperator::Union | SetOperator::ImpliedUnion => lhs.matches(path, graph) || rhs.matches(path, graph),
                SetOperator::Intersection => lhs.matches(path, graph) && rhs.matches(path, graph),
                SetOperator::Difference => lhs.matches(path, graph) && !rhs.matches(path, graph),
            },
        }
    }
}

/// A resolved expression bound to the graph its predicates read.
#[derive(Clone)]
pub struct ExpressionEvaluator {
    expression: PathExpression,
    graph: Arc<dyn ObjectGraph>,
}

impl ExpressionEvaluator {
    #[must_use]
    pub fn new(expression: PathExpression, graph: Arc<dyn ObjectGraph>) -> Self {
        Self { expression, graph }
    }

    #[must_use]
    pub const fn expression(&self) -> &PathExpression {
        &self.expression
    }

    #[must_use]
    pub fn matches(&self, path: &ObjectPath) -> bool {
        self.expression.matches(path, &*self.graph)
    }
}

impl Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExpressionEvaluator")
            .field("expression", &self.expression.to_string())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Stage;

    fn path(text: &str) -> ObjectPath {
        ObjectPath::parse(text).unwrap()
    }

    fn evaluator(text: &str) -> ExpressionEvaluator {
        let mut stage = Stage::new();
        stage.define_container(&path("/A/B/C")).unwrap();
        stage.define_container(&path("/A/D")).unwrap();
        ExpressionEvaluator::new(PathExpression::parse(text).unwrap(), Arc::new(stage))
    }

    #[test]
    fn test_set_operators() {
        let difference = evaluator("/A// - /A/B//");
        assert!(difference.matches(&path("/A")));
        assert!(difference.matches(&path("/A/D")));
        assert!(!difference.matches(&path("/A/B/C")));

        let intersection = evaluator("/A// & //D");
        assert!(intersection.matches(&path("/A/D")));
        assert!(!intersection.matches(&path("/A")));

        let complement = evaluator("~/A//");
        assert!(complement.matches(&path("/Other")));
        assert!(complement.matches(&path("/A.prop")));
        assert!(!complement.matches(&path("/A/B")));
    }

    #[test]
    fn test_unresolved_terms_match_nothing() {
        assert!(!evaluator("%/A:other").matches(&path("/A")));
        assert!(!evaluator("B").matches(&path("/B")));
        assert!(!evaluator("").matches(&ObjectPath::root()));
    }
}
