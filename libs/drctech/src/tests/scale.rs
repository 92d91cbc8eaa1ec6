use test_log::test;

use crate::config::DrcConfig;
use crate::diagnostics::{Cause, Severity};
use crate::registry::DrcTech;
use crate::rule::MAX_DISTANCE;
use crate::tests::{compile_lines, fixture, issues_with};
use crate::types::TileType;

fn unoptimized(lines: &[&[&str]]) -> DrcTech {
    let config = DrcConfig {
        rule_optimization: false,
        ..Default::default()
    };
    let mut drc = compile_lines(fixture().tech, config, lines);
    drc.finish();
    drc
}

fn width_of(drc: &DrcTech, t: TileType) -> (i32, i32) {
    let rule = drc.style().unwrap().rules().bucket(TileType::SPACE, t)[0].checked();
    (rule.dist(), rule.corner_dist())
}

#[test]
fn rescaling_back_restores_distances() {
    let f = fixture();
    let lines: &[&[&str]] = &[
        &["width", "m1", "7", "m1 width"],
        &["maxwidth", "m2", "7", "bend_ok", "m2 max width"],
        &["area", "poly", "21", "4", "poly area"],
    ];

    for (n, d) in [(3, 1), (1, 3), (2, 5)] {
        let mut drc = unoptimized(lines);
        drc.rescale(n, d);
        drc.rescale(d, n);
        assert_eq!(width_of(&drc, f.m1), (7, 7), "rescaled by {n}/{d}");
        assert_eq!(width_of(&drc, f.m2), (7, 7), "rescaled by {n}/{d}");
        assert_eq!(width_of(&drc, f.poly), (4, 21), "rescaled by {n}/{d}");
        assert_eq!(drc.style().unwrap().scale_factor(), (1, 1));
    }
}

#[test]
fn scaling_down_rounds_widths_up_and_max_widths_down() {
    let f = fixture();
    let mut drc = unoptimized(&[
        &["width", "m1", "7", "m1 width"],
        &["maxwidth", "m2", "7", "bend_ok", "m2 max width"],
    ]);
    drc.rescale(3, 1);
    assert_eq!(width_of(&drc, f.m1), (3, 3));
    assert_eq!(width_of(&drc, f.m2).0, 2);
    assert_eq!(drc.style().unwrap().scale_factor(), (3, 1));

    // Equal and non-positive factors are ignored.
    drc.rescale(4, 4);
    drc.rescale(0, 2);
    assert_eq!(drc.style().unwrap().scale_factor(), (3, 1));
}

#[test]
fn scale_factor_divides_distances() {
    let f = fixture();
    let drc = unoptimized(&[&["scalefactor", "2"], &["width", "m1", "4", "m1 width"]]);
    let style = drc.style().unwrap();
    assert_eq!(width_of(&drc, f.m1), (2, 2));
    assert_eq!(style.halo(), 2);
    assert_eq!(style.scale_factor(), (2, 1));
    assert_eq!(style.step_size(), 32);

    let drc = unoptimized(&[&["scalefactor", "3"], &["width", "m1", "7", "m1 width"]]);
    assert_eq!(width_of(&drc, f.m1), (3, 3));
    assert_eq!(drc.style().unwrap().halo(), 3);

    let drc = unoptimized(&[&["scalefactor", "2.5"], &["width", "m1", "4", "m1 width"]]);
    assert_eq!(drc.style().unwrap().scale_factor(), (2, 1));
}

#[test]
fn bad_scale_factor_falls_back_to_one() {
    let f = fixture();
    for argv in [
        &["scalefactor", "0"][..],
        &["scalefactor", "abc"][..],
        &["scalefactor", "2", "-1"][..],
    ] {
        let drc = unoptimized(&[argv, &["width", "m1", "4", "m1 width"]]);
        let errors = issues_with(&drc, Severity::Error);
        assert_eq!(errors.len(), 1, "{argv:?}");
        assert!(matches!(errors[0].cause(), Cause::BadScaleFactor { .. }));
        assert_eq!(drc.style().unwrap().scale_factor(), (1, 1));
        assert_eq!(width_of(&drc, f.m1), (4, 4));
    }
}

#[test]
fn huge_scale_factors_saturate() {
    let f = fixture();
    let limit = MAX_DISTANCE.to_string();
    let drc = unoptimized(&[
        &["scalefactor", "1", "1000000000"],
        &["width", "m1", limit.as_str(), "m1 width"],
    ]);
    let style = drc.style().unwrap();
    assert_eq!(width_of(&drc, f.m1), (i32::MAX, i32::MAX));
    assert_eq!(style.halo(), i32::MAX);
    assert_eq!(style.step_size(), i32::MAX);
}

#[test]
fn overflowing_rescale_is_ignored() {
    let f = fixture();
    let mut drc = unoptimized(&[&["width", "m1", "4", "m1 width"]]);
    drc.rescale(1, 1_000_000);
    assert_eq!(width_of(&drc, f.m1), (4_000_000, 4_000_000));

    drc.rescale(1, 1_000_000);
    assert_eq!(drc.style().unwrap().scale_factor(), (1, 1_000_000));
    assert_eq!(width_of(&drc, f.m1), (4_000_000, 4_000_000));

    drc.rescale(1_000_000, 1);
    assert_eq!(drc.style().unwrap().scale_factor(), (1, 1));
    assert_eq!(width_of(&drc, f.m1), (4, 4));
    assert_eq!(drc.style().unwrap().halo(), 4);
}
