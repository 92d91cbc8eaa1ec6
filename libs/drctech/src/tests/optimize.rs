use test_log::test;

use crate::config::DrcConfig;
use crate::optimize::{collapse_illegal_edges, remove_subsumed};
use crate::rule::{Direction, EdgeRule, Rule};
use crate::table::RuleTable;
use crate::tests::{compile_lines, fixture, Fixture};
use crate::types::{PlaneId, TileType, TypeMask};
use crate::why::WhyId;

fn edge(dist: i32, ok: &[TileType], plane: PlaneId) -> EdgeRule {
    let ok: TypeMask = ok.iter().copied().collect();
    EdgeRule::new(Direction::Forward, dist, dist, ok, ok, WhyId::default()).on(plane, plane)
}

fn table(f: &Fixture) -> RuleTable {
    RuleTable::new(f.tech.num_types())
}

#[test]
fn narrower_ok_set_at_larger_distance_covers() {
    let f = fixture();
    let corner = TypeMask::single(f.m1);
    let rule = |dist: i32, ok: &[TileType]| {
        let ok: TypeMask = ok.iter().copied().collect();
        EdgeRule::new(Direction::Forward, dist, dist, ok, corner, WhyId::default())
            .on(f.metal1, f.metal1)
    };

    let mut t = table(&f);
    t.insert(f.m1, TileType::SPACE, rule(2, &[TileType::SPACE, f.via]));
    t.insert(f.m1, TileType::SPACE, rule(5, &[TileType::SPACE]));
    assert_eq!(remove_subsumed(&mut t, &f.tech), 1);
    let bucket = t.bucket(f.m1, TileType::SPACE);
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket[0].key(), 5);

    let mut t = table(&f);
    t.insert(f.m1, TileType::SPACE, rule(5, &[TileType::SPACE, f.via]));
    t.insert(f.m1, TileType::SPACE, rule(2, &[TileType::SPACE]));
    assert_eq!(remove_subsumed(&mut t, &f.tech), 0);
    assert_eq!(t.bucket(f.m1, TileType::SPACE).len(), 2);
}

#[test]
fn wider_ok_set_never_covers() {
    let f = fixture();
    let corner = TypeMask::single(f.m1);
    let rule = |dist: i32, ok: &[TileType]| {
        let ok: TypeMask = ok.iter().copied().collect();
        EdgeRule::new(Direction::Forward, dist, dist, ok, corner, WhyId::default())
            .on(f.metal1, f.metal1)
    };

    // A rule only covers another when its OK types are a subset of the
    // other's, so the farther rule accepting via keeps the nearer one.
    let mut t = table(&f);
    t.insert(f.m1, TileType::SPACE, rule(2, &[TileType::SPACE]));
    t.insert(f.m1, TileType::SPACE, rule(5, &[TileType::SPACE, f.via]));
    assert_eq!(remove_subsumed(&mut t, &f.tech), 0);
    assert_eq!(t.bucket(f.m1, TileType::SPACE).len(), 2);

    // Swapping the distances lets the narrower rule cover the wider one.
    let mut t = table(&f);
    t.insert(f.m1, TileType::SPACE, rule(5, &[TileType::SPACE]));
    t.insert(f.m1, TileType::SPACE, rule(2, &[TileType::SPACE, f.via]));
    assert_eq!(remove_subsumed(&mut t, &f.tech), 1);
    let bucket = t.bucket(f.m1, TileType::SPACE);
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket[0].key(), 5);
}

#[test]
fn covering_requires_matching_geometry() {
    let f = fixture();
    let mut t = table(&f);
    t.insert(f.m1, TileType::SPACE, edge(2, &[TileType::SPACE], f.metal1));
    t.insert(
        f.m1,
        TileType::SPACE,
        edge(2, &[TileType::SPACE], f.metal1).with_outside(),
    );
    t.insert(f.m1, TileType::SPACE, edge(6, &[TileType::SPACE], f.active));
    // Equal distances only cover when the outside flags agree.
    assert_eq!(remove_subsumed(&mut t, &f.tech), 0);
    assert_eq!(t.bucket(f.m1, TileType::SPACE).len(), 3);

    let mut t = table(&f);
    t.insert(
        f.m1,
        TileType::SPACE,
        edge(2, &[TileType::SPACE], f.metal1).with_both_corners(),
    );
    t.insert(f.m1, TileType::SPACE, edge(5, &[TileType::SPACE], f.metal1));
    assert_eq!(remove_subsumed(&mut t, &f.tech), 0);
}

#[test]
fn triggered_units_never_cover() {
    let f = fixture();
    let mut t = table(&f);
    t.insert(f.m1, TileType::SPACE, edge(2, &[TileType::SPACE, f.via], f.metal1));
    t.insert(
        f.m1,
        TileType::SPACE,
        Rule::Triggered {
            trigger: edge(1, &[f.m2], f.metal1),
            rule: edge(5, &[TileType::SPACE], f.metal1),
        },
    );
    assert_eq!(remove_subsumed(&mut t, &f.tech), 0);
    assert_eq!(t.bucket(f.m1, TileType::SPACE).len(), 2);

    // A triggered unit may itself be covered, and leaves as a whole.
    let mut t = table(&f);
    t.insert(
        f.m1,
        TileType::SPACE,
        Rule::Triggered {
            trigger: edge(1, &[f.m2], f.metal1),
            rule: edge(2, &[TileType::SPACE, f.via], f.metal1),
        },
    );
    t.insert(f.m1, TileType::SPACE, edge(5, &[TileType::SPACE], f.metal1));
    assert_eq!(remove_subsumed(&mut t, &f.tech), 1);
    assert_eq!(t.num_edge_rules(), 1);
}

#[test]
fn illegal_edges_collapse_to_one_rule() {
    let f = fixture();
    let mut t = table(&f);
    t.insert(f.poly, f.ndiff, edge(2, &[TileType::SPACE], f.active));
    t.insert(f.poly, f.ndiff, edge(4, &[TileType::SPACE, f.nfet], f.active));
    t.insert(
        f.poly,
        f.ndiff,
        Rule::Triggered {
            trigger: edge(1, &[f.m1], f.active),
            rule: edge(3, &[TileType::SPACE], f.active),
        },
    );
    // Legal edges are untouched.
    t.insert(f.poly, TileType::SPACE, edge(2, &[TileType::SPACE], f.active));
    t.insert(f.poly, TileType::SPACE, edge(3, &[f.nfet], f.active));

    assert_eq!(collapse_illegal_edges(&mut t, &f.tech), 3);
    let bucket = t.bucket(f.poly, f.ndiff);
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket[0], Rule::Simple(edge(2, &[TileType::SPACE], f.active)));
    assert_eq!(t.bucket(f.poly, TileType::SPACE).len(), 2);

    let before = t.clone();
    assert_eq!(collapse_illegal_edges(&mut t, &f.tech), 0);
    assert_eq!(
        t.bucket(f.poly, f.ndiff),
        before.bucket(f.poly, f.ndiff)
    );
}

#[test]
fn a_witness_trigger_replaces_its_unit() {
    let f = fixture();
    let mut t = table(&f);
    t.insert(
        f.poly,
        f.ndiff,
        Rule::Triggered {
            trigger: edge(1, &[TileType::SPACE], f.active),
            rule: edge(6, &[f.ndiff], f.active),
        },
    );
    t.insert(f.poly, f.ndiff, edge(4, &[f.ndiff], f.metal1));

    assert_eq!(collapse_illegal_edges(&mut t, &f.tech), 1);
    let bucket = t.bucket(f.poly, f.ndiff);
    assert_eq!(bucket.len(), 2);
    assert_eq!(bucket[0].key(), 1);
    assert!(!bucket[0].is_triggered());
    assert!(t.is_sorted());
}

#[test]
fn finishing_counts_optimized_rules() {
    let f = fixture();
    let lines: &[&[&str]] = &[
        &["spacing", "m1", "m1", "3", "touching_illegal", "short"],
        &["spacing", "m1", "m1", "5", "touching_illegal", "long"],
    ];

    let mut drc = compile_lines(fixture().tech, DrcConfig::default(), lines);
    drc.finish();
    let style = drc.style().unwrap();
    assert_eq!(style.rules_optimized(), 3);
    assert_eq!(style.rules().bucket(f.m1, TileType::SPACE).len(), 1);
    assert_eq!(style.rules().bucket(f.m1, TileType::SPACE)[0].key(), 5);

    let config = DrcConfig {
        rule_optimization: false,
        ..Default::default()
    };
    let mut drc = compile_lines(f.tech, config, lines);
    drc.finish();
    let style = drc.style().unwrap();
    assert_eq!(style.rules_optimized(), 0);
    assert_eq!(style.rules().num_edge_rules(), 6);
}
