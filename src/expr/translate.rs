use super::{PathExpression, PathPattern, SetOperator};
use crate::collection::{ExpansionRule, FlattenedRuleMap, MembershipRule};
use crate::path::ObjectPath;

/// Builds an expression that matches exactly the paths a rule map includes.
///
/// Entries are applied from the shallowest to the deepest, so by the time an
/// entry is reached everything above it has been accounted for. An entry first
/// carves its subtree out of what its nearest ancestor entry already covered,
/// then adds back its own coverage when it is an include.
#[must_use]
pub fn rule_map_to_expression(rule_map: &FlattenedRuleMap) -> PathExpression {
    let mut entries: Vec<(&ObjectPath, MembershipRule)> = rule_map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.element_count().cmp(&b.element_count()).then_with(|| a.cmp(b)));

    let mut expression = PathExpression::Nothing;
    for (path, rule) in entries {
        let inherited = path.parent().and_then(|parent| rule_map.governing_entry(&parent).map(|(_, rule)| rule));
        if inherited.is_some_and(|ancestor| covers_subtree_of(ancestor, path)) {
            expression = PathExpression::combine(SetOperator::Difference, expression, subtree(path));
        }

        if let MembershipRule::Include(expansion) = rule {
            expression = PathExpression::combine(SetOperator::ImpliedUnion, expression, coverage(path, expansion));
        }
    }

    expression
}

/// Whether an ancestor's entry reaches anything at or below `path`.
fn covers_subtree_of(ancestor: MembershipRule, path: &ObjectPath) -> bool {
    match ancestor {
        MembershipRule::Include(rule) if path.is_property() => rule.expands_properties(),
        MembershipRule::Include(rule) => rule.expands_containers(),
        MembershipRule::Exclude => false,
    }
}

fn subtree(path: &ObjectPath) -> PathExpression {
    if path.is_property() {
        return PathExpression::Pattern(PathPattern::exact(path));
    }

    PathExpression::binary(
        SetOperator::ImpliedUnion,
        PathExpression::Pattern(PathPattern::subtree_containers(path)),
        PathExpression::Pattern(PathPattern::subtree_properties(path)),
    )
}

fn coverage(path: &ObjectPath, rule: ExpansionRule) -> PathExpression {
    if path.is_property() {
        return PathExpression::Pattern(PathPattern::exact(path));
    }

    match rule {
        ExpansionRule::ExplicitOnly => PathExpression::Pattern(PathPattern::exact(path)),
        ExpansionRule::ExpandContainers => PathExpression::Pattern(PathPattern::subtree_containers(path)),
        ExpansionRule::ExpandContainersAndProperties => subtree(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ObjectGraph, Stage};

    fn path(text: &str) -> ObjectPath {
        ObjectPath::parse(text).unwrap()
    }

    fn rule_map(entries: &[(&str, MembershipRule)]) -> FlattenedRuleMap {
        entries.iter().map(|(p, rule)| (path(p), *rule)).collect()
    }

    const EXPAND: MembershipRule = MembershipRule::Include(ExpansionRule::ExpandContainers);
    const EXPAND_ALL: MembershipRule = MembershipRule::Include(ExpansionRule::ExpandContainersAndProperties);
    const EXPLICIT: MembershipRule = MembershipRule::Include(ExpansionRule::ExplicitOnly);

    fn stage() -> Stage {
        let mut stage = Stage::new();
        for container in ["/G/S/T", "/G/U", "/X/Y/Z", "/X/W", "/Other"] {
            stage.define_container(&path(container)).unwrap();
        }
        for container in ["/G", "/G/S", "/G/S/T", "/X/Y", "/X/W", "/Other"] {
            let _ = stage.add_property(&path(container), "leaf").unwrap();
        }
        stage
    }

    fn assert_round_trip(rules: &FlattenedRuleMap, include_root: bool) {
        let stage = stage();
        let expression = rule_map_to_expression(rules);
        let mut candidates: Vec<ObjectPath> = stage.traverse(true).iter().map(|object| object.path().clone()).collect();
        candidates.push(ObjectPath::root());

        for candidate in candidates {
            assert_eq!(
                rules.includes(&candidate, include_root),
                expression.matches(&candidate, &stage),
                "'{candidate}' disagrees with '{expression}'"
            );
        }
    }

    #[test]
    fn test_expanding_includes() {
        let rules = rule_map(&[("/G", EXPAND)]);
        insta::assert_snapshot!(rule_map_to_expression(&rules).to_string(), @"/G//");
        assert_round_trip(&rules, false);

        let rules = rule_map(&[("/G", EXPAND_ALL)]);
        insta::assert_snapshot!(rule_map_to_expression(&rules).to_string(), @"/G// /G//.*");
        assert_round_trip(&rules, false);
    }

    #[test]
    fn test_excluded_subtree_with_reinclude() {
        let rules = rule_map(&[("/", EXPAND), ("/X", MembershipRule::Exclude), ("/X/Y", EXPAND)]);
        insta::assert_snapshot!(rule_map_to_expression(&rules).to_string(), @"(// - /X// /X//.*) /X/Y//");
        assert_round_trip(&rules, true);
    }

    #[test]
    fn test_explicit_and_property_entries() {
        let rules = rule_map(&[("/G", EXPLICIT), ("/G/S.leaf", EXPLICIT), ("/X", EXPAND_ALL), ("/X/Y.leaf", MembershipRule::Exclude)]);
        assert_round_trip(&rules, false);

        let rules = rule_map(&[("/G", EXPAND), ("/G/S", EXPLICIT), ("/G/S/T.leaf", EXPAND)]);
        assert_round_trip(&rules, false);
    }

    #[test]
    fn test_excludes_alone_match_nothing() {
        let rules = rule_map(&[("/G", MembershipRule::Exclude)]);
        assert!(rule_map_to_expression(&rules).is_empty());
        assert_round_trip(&rules, false);
        assert!(rule_map_to_expression(&FlattenedRuleMap::new()).is_empty());
    }

    #[test]
    fn test_root_explicit_only() {
        let rules = rule_map(&[("/", EXPLICIT)]);
        insta::assert_snapshot!(rule_map_to_expression(&rules).to_string(), @"/");
        assert_round_trip(&rules, true);
    }
}
