use test_log::test;

use crate::report::MAX_BIN;
use crate::tests::{compile, fixture};

fn table_text(lines: &[&[&str]]) -> String {
    let drc = compile(lines);
    let mut out = Vec::new();
    drc.write_rules_table(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn stats_count_rules_per_edge() {
    let f = fixture();
    let mut drc = compile(&[
        &["width", "m1", "3", "m1 width"],
        &["width", "m1", "2", "redundant"],
    ]);
    drc.finish();
    let stats = drc.rule_stats().unwrap();
    assert_eq!(stats.specified, 2);
    assert_eq!(stats.optimized, 3);
    assert_eq!(stats.remaining, 3);
    assert_eq!(stats.histogram[1], 3);
    assert_eq!(stats.overflow, 0);

    let edges = f
        .tech
        .types()
        .flat_map(|i| f.tech.types().map(move |j| (i, j)))
        .filter(|(i, j)| !f.tech.types_on_same_plane(*i, *j).is_empty())
        .count();
    assert_eq!(stats.histogram.iter().sum::<usize>(), edges);

    let text = stats.to_string();
    assert!(text.starts_with("Total number of rules specified in tech file: 2\n"));
    assert!(text.contains("Edge rules optimized away: 3\n"));
    assert!(text.contains("   1 rules/edge: 3.\n"));
    assert!(text.ends_with(&format!(" >{MAX_BIN} rules/edge: 0.\n")));
}

#[test]
fn rules_table_lists_buckets() {
    let text = table_text(&[&["width", "m1", "3", "m1 width"]]);
    assert!(text.contains("space    m1        3 x 3   m1 (metal1)\n"));
    assert!(text.contains("via      m1        3 x 3   m1 (metal1)\n"));
    assert!(!text.contains("m1       space"));
}

#[test]
fn rules_table_shows_flags() {
    let text = table_text(&[&[
        "widespacing",
        "m1",
        "10",
        "m1",
        "6",
        "touching_illegal",
        "wide m1",
    ]]);
    assert!(text.contains("10 x 10   m1 (metal1)"));
    assert!(text.contains(" reverse trigger maxwidth bends\n"));
    assert!(text.contains(" both-corners\n"));
    assert!(text.contains(" reverse both-corners\n"));
}

#[test]
fn rules_table_lists_overlaps() {
    let text = table_text(&[&["no_overlap", "m1", "m2"], &["exact_overlap", "via"]]);
    assert!(text.contains("Tile type m1 can't overlap type m2.\n"));
    assert!(text.contains("Tile type m2 can't overlap type m1.\n"));
    assert!(text.ends_with("Types that must overlap exactly: via\n"));
}

#[test]
fn default_layer_queries() {
    let f = fixture();
    let drc = compile(&[
        &["width", "m1", "3", "m1 width"],
        &["width", "m1", "2", "smaller"],
        &["spacing", "m1", "m1", "4", "touching_illegal", "m1 spacing"],
        &["surround", "via", "m2", "1", "absence_illegal", "via in m2"],
    ]);
    assert_eq!(drc.default_layer_width(f.m1), 3);
    assert_eq!(drc.default_layer_width(f.m2), 0);
    assert_eq!(drc.default_layer_spacing(f.m1, f.m1), 4);
    assert_eq!(drc.default_layer_spacing(f.m1, f.m2), 0);
    assert_eq!(drc.default_layer_surround(f.via, f.m2), 1);
    assert_eq!(drc.default_layer_surround(f.m1, f.m2), 0);

    let mut drc = compile(&[&[
        "widespacing",
        "m1",
        "10",
        "m1",
        "6",
        "touching_illegal",
        "wide only",
    ]]);
    assert_eq!(drc.default_layer_spacing(f.m1, f.m1), 0);

    drc.reset();
    assert_eq!(drc.default_layer_width(f.m1), 0);
    assert!(drc.rule_stats().is_none());
}
