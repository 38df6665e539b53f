//! End-to-end tests over the scene in `tests/fixtures/collection_test.toml`.
//!
//! The fixture is loaded through [`SceneDocument`], so these tests exercise the
//! whole path from TOML text to stage, membership queries, enumeration,
//! expression resolution and validation.

use camino::Utf8Path;
use collection_membership::config::SceneDocument;
use collection_membership::expr::PathExpression;
use collection_membership::{
    CollectionId, CollectionSpec, ExpansionRule, MembershipQuery, ObjectGraph, ObjectPath, Stage, compute_included_objects,
    resolve_complete_membership_expression, validate,
};
use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;
use std::sync::Arc;

fn path(text: &str) -> ObjectPath {
    ObjectPath::parse(text).unwrap()
}

fn load_stage() -> Stage {
    let fixture = Utf8Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/collection_test.toml"));
    SceneDocument::load(fixture)
        .expect("fixture should load")
        .into_stage()
        .expect("fixture should build a stage")
}

fn fixture() -> Arc<Stage> {
    Arc::new(load_stage())
}

fn spec(stage: &Stage, owner: &str, name: &str) -> CollectionSpec {
    let id = CollectionId::new(path(owner), name).unwrap();
    stage
        .collection_spec(&id)
        .cloned()
        .unwrap_or_else(|| panic!("fixture should define collection '{id}'"))
}

fn test_spec(stage: &Stage, name: &str) -> CollectionSpec {
    spec(stage, "/CollectionTest", name)
}

fn query(stage: &Arc<Stage>, name: &str) -> MembershipQuery {
    test_spec(stage, name).compute_membership_query(stage)
}

fn members(query: &MembershipQuery, stage: &Stage, include_instance_proxies: bool) -> Vec<String> {
    compute_included_objects(query, stage, include_instance_proxies)
        .iter()
        .map(|object| object.path().to_string())
        .collect()
}

fn hash_of(query: &MembershipQuery) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

fn assert_round_trips(query: &MembershipQuery, stage: &Stage) {
    let expression = query.to_expression();
    let mut paths: Vec<ObjectPath> = stage.traverse(true).iter().map(|object| object.path().clone()).collect();
    paths.push(ObjectPath::root());

    for candidate in &paths {
        assert_eq!(
            query.is_included(candidate).unwrap(),
            expression.matches(candidate, stage),
            "query and '{expression}' disagree on '{candidate}'"
        );
    }
}

#[test]
fn test_explicit_only_collection() {
    let stage = fixture();
    let query = query(&stage, "test:Explicit:Collection");

    assert_eq!(
        members(&query, &stage, false),
        [
            "/CollectionTest/Geom/Shapes/Cone",
            "/CollectionTest/Geom/Shapes/Cube",
            "/CollectionTest/Geom/Shapes/Cylinder",
            "/CollectionTest/Geom/Shapes/Sphere",
        ]
    );
    assert!(!query.is_included(&path("/CollectionTest/Geom/Shapes")).unwrap());
    assert!(!query.is_included(&path("/CollectionTest/Geom/Shapes/Sphere/Hemisphere1")).unwrap());
    assert!(!query.is_included(&path("/CollectionTest/Geom/Shapes/Cone.height")).unwrap());
}

#[test]
fn test_explicit_property_collection() {
    let stage = fixture();
    let query = query(&stage, "coneProperties");

    assert_eq!(
        members(&query, &stage, false),
        ["/CollectionTest/Geom/Shapes/Cone.height", "/CollectionTest/Geom/Shapes/Cone.radius"]
    );
    assert!(!query.is_included(&path("/CollectionTest/Geom/Shapes/Cone")).unwrap());
}

#[test]
fn test_expand_containers_collection() {
    let stage = fixture();
    let query = query(&stage, "expandPrims");

    assert_eq!(
        members(&query, &stage, false),
        [
            "/CollectionTest/Geom",
            "/CollectionTest/Geom/Box",
            "/CollectionTest/Geom/Shapes",
            "/CollectionTest/Geom/Shapes/Cone",
            "/CollectionTest/Geom/Shapes/Cube",
            "/CollectionTest/Geom/Shapes/Cylinder",
            "/CollectionTest/Geom/Shapes/Sphere",
            "/CollectionTest/Geom/Shapes/Sphere/Hemisphere1",
            "/CollectionTest/Geom/Shapes/Sphere/Hemisphere2",
        ]
    );
    assert!(!query.is_included(&path("/CollectionTest/Geom.visibility")).unwrap());
    assert!(!query.is_included(&path("/CollectionTest/Materials")).unwrap());
}

#[test]
fn test_excluding_a_subtree() {
    let stage = fixture();
    let excluded = test_spec(&stage, "expandPrims").with_excludes([path("/CollectionTest/Geom/Shapes")]);
    let query = excluded.compute_membership_query(&stage);

    assert_eq!(members(&query, &stage, false), ["/CollectionTest/Geom", "/CollectionTest/Geom/Box"]);
    assert!(!query.is_included(&path("/CollectionTest/Geom/Shapes/Sphere/Hemisphere1")).unwrap());
}

#[test]
fn test_expand_containers_and_properties_collection() {
    let stage = fixture();
    let query = query(&stage, "expandPrimsAndProperties");
    let members = members(&query, &stage, false);

    assert_eq!(members.len(), 15);
    assert_eq!(members.iter().filter(|member| member.contains('.')).count(), 8);
    assert_eq!(members.first().map(String::as_str), Some("/CollectionTest/Geom/Shapes"));
    assert!(members.contains(&"/CollectionTest/Geom/Shapes/Sphere/Hemisphere2.points".to_string()));
    assert!(!query.is_included(&path("/CollectionTest/Geom.visibility")).unwrap());
}

#[test]
fn test_instance_proxies_are_opt_in() {
    let stage = fixture();
    let query = query(&stage, "instances");

    assert_eq!(members(&query, &stage, false), ["/CollectionTest/Geom/Box"]);
    assert_eq!(
        members(&query, &stage, true),
        ["/CollectionTest/Geom/Box", "/CollectionTest/Geom/Box/Proto"]
    );
    assert!(query.is_included(&path("/CollectionTest/Geom/Box/Proto")).unwrap());
}

#[test]
fn test_circular_includes_are_elided() {
    let stage = fixture();
    let materials = [
        "/CollectionTest/Geom/Shapes/Cone",
        "/CollectionTest/Geom/Shapes/Cube",
        "/CollectionTest/Geom/Shapes/Cylinder",
        "/CollectionTest/Materials",
        "/CollectionTest/Materials/Metal",
        "/CollectionTest/Materials/Plastic",
    ];

    let cases = [
        ("cycleA", ["cycleB", "cycleC", "cycleD"]),
        ("cycleB", ["cycleC", "cycleA", "cycleD"]),
        ("cycleC", ["cycleA", "cycleB", "cycleD"]),
    ];

    for (name, nested) in cases {
        let query = query(&stage, name);
        assert_eq!(members(&query, &stage, false), materials, "members of {name}");

        let expected: Vec<ObjectPath> = nested
            .iter()
            .map(|nested| path(&format!("/CollectionTest.collection:{nested}")))
            .collect();
        assert_eq!(query.included_collections(), expected.as_slice(), "nested collections of {name}");

        let outcome = validate(&test_spec(&stage, name), &*stage);
        assert!(!outcome.valid, "{name} should be invalid");
        assert!(outcome.reason.contains("circular reference"), "{}", outcome.reason);
    }

    let acyclic = validate(&test_spec(&stage, "cycleD"), &*stage);
    assert!(acyclic.valid, "{}", acyclic.reason);
}

#[test]
fn test_self_referential_collection() {
    let stage = fixture();
    let query = query(&stage, "selfReferential");

    assert!(query.included_collections().is_empty());
    assert!(members(&query, &stage, true).is_empty());

    let outcome = validate(&test_spec(&stage, "selfReferential"), &*stage);
    assert!(!outcome.valid);
    assert!(outcome.reason.contains("circular reference"), "{}", outcome.reason);
}

#[test]
fn test_later_nested_collection_wins() {
    let stage = fixture();
    let expand = test_spec(&stage, "expandPrims").collection_path().clone();
    let explicit = test_spec(&stage, "geomExplicit").collection_path().clone();
    let combined = CollectionSpec::new(CollectionId::new(path("/CollectionTest"), "combined").unwrap());

    let explicit_last = combined.clone().with_includes([expand.clone(), explicit.clone()]);
    assert_eq!(members(&explicit_last.compute_membership_query(&stage), &stage, false), ["/CollectionTest/Geom"]);

    let expand_last = combined.with_includes([explicit, expand]);
    assert_eq!(members(&expand_last.compute_membership_query(&stage), &stage, false).len(), 9);
}

#[test]
fn test_include_and_exclude_edits() {
    let stage = fixture();
    let mut edits = CollectionSpec::new(CollectionId::new(path("/CollectionTest"), "edits").unwrap());
    let count = |spec: &CollectionSpec| members(&spec.compute_membership_query(&stage), &stage, false).len();

    edits.include_path(&path("/CollectionTest/Geom"), &*stage).unwrap();
    assert_eq!(count(&edits), 9);

    edits.exclude_path(&path("/CollectionTest/Geom/Shapes"), &*stage).unwrap();
    assert_eq!(count(&edits), 2);

    edits.include_path(&path("/CollectionTest/Geom/Shapes/Sphere"), &*stage).unwrap();
    assert_eq!(count(&edits), 5);

    edits
        .exclude_path(&path("/CollectionTest/Geom/Shapes/Sphere/Hemisphere2"), &*stage)
        .unwrap();
    assert_eq!(count(&edits), 4);

    edits.include_path(&path("/CollectionTest/Geom/Shapes"), &*stage).unwrap();
    assert_eq!(count(&edits), 8);
    assert_eq!(edits.excludes, [path("/CollectionTest/Geom/Shapes/Sphere/Hemisphere2")]);

    edits
        .include_path(&path("/CollectionTest/Geom/Shapes/Sphere/Hemisphere2"), &*stage)
        .unwrap();
    assert_eq!(count(&edits), 9);
    assert!(edits.excludes.is_empty());
    assert_eq!(
        edits.includes,
        [path("/CollectionTest/Geom"), path("/CollectionTest/Geom/Shapes/Sphere")]
    );

    assert!(edits.include_path(&path("Geom"), &*stage).is_err());
}

#[test]
fn test_include_root_with_exclusions() {
    let stage = fixture();
    let mut rooted = CollectionSpec::new(CollectionId::new(path("/CollectionTest"), "rooted").unwrap());

    rooted.include_path(&ObjectPath::root(), &*stage).unwrap();
    assert!(rooted.include_root);

    rooted.exclude_path(&path("/CollectionTest/Geom"), &*stage).unwrap();
    rooted.include_path(&path("/CollectionTest/Geom/Box"), &*stage).unwrap();

    let query = rooted.compute_membership_query(&stage);
    assert!(query.is_included(&ObjectPath::root()).unwrap());
    assert!(!query.is_included(&path("/CollectionTest/Geom")).unwrap());
    assert_eq!(
        members(&query, &stage, false),
        [
            "/CollectionExprTest",
            "/CollectionTest",
            "/CollectionTest/Geom/Box",
            "/CollectionTest/Materials",
            "/CollectionTest/Materials/Metal",
            "/CollectionTest/Materials/Plastic",
        ]
    );
    assert_round_trips(&query, &stage);
}

#[test]
fn test_relationship_queries_round_trip_through_expressions() {
    let stage = fixture();
    let names = [
        "test:Explicit:Collection",
        "expandPrims",
        "expandPrimsAndProperties",
        "geomExplicit",
        "coneProperties",
        "instances",
        "cycleA",
        "cycleB",
        "cycleC",
        "cycleD",
    ];

    for name in names {
        let query = query(&stage, name);
        assert!(query.uses_rule_map(), "{name} should use a rule map");
        assert_round_trips(&query, &stage);
    }
}

#[test]
fn test_membership_expression_collection() {
    let stage = fixture();
    let with_expression = test_spec(&stage, "withMembershipExpr");
    assert!(with_expression.is_in_expression_mode());

    let resolved = resolve_complete_membership_expression(&with_expression, &*stage);
    assert_eq!(
        resolved.to_string(),
        "/CollectionTest/Geom//C* //{model} //Box /CollectionTest/Geom/Shapes//H*"
    );

    let query = with_expression.compute_membership_query(&stage);
    assert!(!query.uses_rule_map());
    assert_eq!(query.included_collections(), [path("/CollectionTest/Geom/Shapes.collection:hemispheres")]);
    assert_eq!(
        members(&query, &stage, false),
        [
            "/CollectionTest/Geom",
            "/CollectionTest/Geom/Box",
            "/CollectionTest/Geom/Shapes",
            "/CollectionTest/Geom/Shapes/Cone",
            "/CollectionTest/Geom/Shapes/Cube",
            "/CollectionTest/Geom/Shapes/Cylinder",
            "/CollectionTest/Geom/Shapes/Sphere/Hemisphere1",
            "/CollectionTest/Geom/Shapes/Sphere/Hemisphere2",
        ]
    );

    // Resolving an already resolved expression changes nothing.
    let reparsed = with_expression.clone().with_membership_expression(resolved.to_string());
    assert_eq!(resolve_complete_membership_expression(&reparsed, &*stage), resolved);

    assert!(validate(&with_expression, &*stage).valid);
}

#[test]
fn test_implied_union_matches_any_alternative() {
    let stage = fixture();
    let alternatives = ["/CollectionTest/Geom//C*", "//{model}", "//Box"];
    let union = PathExpression::parse(&alternatives.join(" ")).unwrap();
    let parsed: Vec<PathExpression> = alternatives.iter().map(|text| PathExpression::parse(text).unwrap()).collect();

    for object in stage.traverse(true) {
        let candidate = object.path();
        let any = parsed.iter().any(|alternative| alternative.matches(candidate, &*stage));
        assert_eq!(union.matches(candidate, &*stage), any, "disagreement on '{candidate}'");
    }
}

#[test]
fn test_circular_expression_references() {
    let stage = load_stage();
    let resolved = |stage: &Stage, name: &str| {
        resolve_complete_membership_expression(&spec(stage, "/CollectionExprTest", name), stage).to_string()
    };

    assert_eq!(resolved(&stage, "root"), "/root (/ref1 /ref2) - /ref2");
    assert_eq!(resolved(&stage, "ref1"), "/ref1 (/ref2 /root)");
    assert_eq!(resolved(&stage, "ref2"), "/ref2 (/root /ref1)");

    let outcome = validate(&spec(&stage, "/CollectionExprTest", "root"), &stage);
    assert!(!outcome.valid);
    assert!(outcome.reason.contains("circular reference"), "{}", outcome.reason);

    let mut blocked = stage.clone();
    let mut ref2 = spec(&blocked, "/CollectionExprTest", "ref2");
    ref2.membership_expression = None;
    let _ = blocked.set_collection(ref2).unwrap();

    assert_eq!(resolved(&blocked, "root"), "/root /ref1");
    assert_eq!(resolved(&blocked, "ref1"), "/ref1");
    assert_eq!(resolved(&blocked, "ref2"), "");
    assert!(validate(&spec(&blocked, "/CollectionExprTest", "root"), &blocked).valid);
}

#[test]
fn test_query_equality_ignores_nested_collection_list() {
    let stage = fixture();

    let first = query(&stage, "expandPrims");
    let second = query(&stage, "expandPrims");
    assert_eq!(first, second);
    assert_eq!(hash_of(&first), hash_of(&second));

    // Both cycles flatten to the same rules but enter collections in different orders.
    let cycle_a = query(&stage, "cycleA");
    let cycle_b = query(&stage, "cycleB");
    assert_ne!(cycle_a.included_collections(), cycle_b.included_collections());
    assert_eq!(cycle_a, cycle_b);
    assert_eq!(hash_of(&cycle_a), hash_of(&cycle_b));

    assert_ne!(first, query(&stage, "geomExplicit"));
    assert_ne!(first, query(&stage, "withMembershipExpr"));
    assert_eq!(query(&stage, "withMembershipExpr"), query(&stage, "withMembershipExpr"));
}

#[test]
fn test_default_query_matches_nothing() {
    let stage = fixture();
    let query = MembershipQuery::default();

    assert!(query.uses_rule_map());
    assert!(!query.include_root());
    assert!(members(&query, &stage, true).is_empty());
    assert!(query.is_included(&path("relative/path")).is_err());
}

#[test]
fn test_invalid_expression_yields_empty_query() {
    let stage = fixture();
    let broken = CollectionSpec::new(CollectionId::new(path("/CollectionTest"), "broken").unwrap()).with_membership_expression("/CollectionTest/Geom//[C");

    let query = broken.compute_membership_query(&stage);
    assert!(members(&query, &stage, true).is_empty());

    let outcome = validate(&broken, &*stage);
    assert!(!outcome.valid);
    assert!(outcome.reason.contains("does not parse"), "{}", outcome.reason);
}

#[test]
fn test_expansion_rule_text_forms() {
    let stage = fixture();
    assert_eq!(test_spec(&stage, "expandPrims").expansion_rule, Some(ExpansionRule::ExpandContainers));
    assert_eq!(
        test_spec(&stage, "expandPrimsAndProperties").expansion_rule.map(|rule| rule.to_string()),
        Some("expandContainersAndProperties".to_string())
    );
    assert_eq!(test_spec(&stage, "instances").expansion_rule, None);
    assert_eq!(test_spec(&stage, "instances").effective_expansion_rule(), ExpansionRule::ExpandContainers);
}
