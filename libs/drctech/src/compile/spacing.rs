//! Spacing rules.

use crate::diagnostics::Cause;
use crate::error::{LayerRole, RuleError};
use crate::rule::{Direction, EdgeRule, Rule, RuleKind};
use crate::types::{PlaneMask, TileType, TypeMask};
use crate::why::WhyId;

use super::{type_pairs, Compiler};

/// What a spacing rule allows between the two sets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Adjacency {
    TouchingOk,
    TouchingIllegal,
    /// The second set may surround the first; needs a trigger.
    SurroundOk,
}

struct Spacing {
    set1: TypeMask,
    set2: TypeMask,
    pmask1: PlaneMask,
    pmask2: PlaneMask,
    wwidth: i32,
    dist: i32,
    adjacency: Adjacency,
    wide: bool,
    why: WhyId,
}

/// `spacing layers1 layers2 separation [layers3] adjacency why`
pub(super) fn spacing(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    if argv.len() == 7 {
        if argv[4] == "corner_ok" {
            return corner_ok(c, argv);
        }
        return Err(RuleError::UnknownSpacingArgument {
            found: argv[4].into(),
        });
    }
    let dist = c.distance(argv[3])?;
    compile(c, argv[1], argv[2], dist, dist, argv[4], argv[5], false)
}

/// `widespacing layers1 width layers2 separation adjacency why`
pub(super) fn wide_spacing(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let wwidth = c.distance(argv[2])?;
    let dist = c.distance(argv[4])?;
    compile(c, argv[1], argv[3], wwidth, dist, argv[5], argv[6], true)
}

/// Evaluates one layer set of a spacing rule.
///
/// Returns the types, their planes and whether the set spans several planes.
/// Sets spanning planes must not have a type on more than one of them.
fn spacing_layers(
    c: &Compiler<'_>,
    expr: &str,
    role: LayerRole,
) -> Result<(TypeMask, PlaneMask, bool), RuleError> {
    let (set, planes) = c.layers(expr)?;
    let shared = c.coincident(&set, planes);
    if !shared.is_empty() || planes.is_empty() {
        return Ok((set, shared, false));
    }
    for p in planes.iter() {
        for p2 in planes.iter().filter(|p2| *p2 != p) {
            let both = c.plane_types(p) & c.plane_types(p2) & set;
            if both.iter(c.tech.num_types()).any(|t| !t.is_reserved()) {
                return Err(RuleError::SharedPlanes { role });
            }
        }
    }
    Ok((set, planes, true))
}

fn adjacency(
    c: &mut Compiler<'_>,
    value: &str,
    multiplane: bool,
    shared: PlaneMask,
    wide: bool,
) -> Result<Adjacency, RuleError> {
    match value {
        "surround_ok" => {
            if multiplane {
                Err(RuleError::SurroundOkMultiplane)
            } else if !shared.is_empty() {
                c.warn(Cause::SurroundOkSamePlane);
                Ok(Adjacency::TouchingOk)
            } else if wide {
                Err(RuleError::WideSurroundOk)
            } else {
                Ok(Adjacency::SurroundOk)
            }
        }
        "touching_ok" => {
            if multiplane || shared.is_empty() {
                Err(RuleError::TouchingOkAcrossPlanes)
            } else {
                Ok(Adjacency::TouchingOk)
            }
        }
        "touching_illegal" => Ok(Adjacency::TouchingIllegal),
        other => Err(RuleError::BadAdjacency {
            found: other.into(),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn compile(
    c: &mut Compiler<'_>,
    layers1: &str,
    layers2: &str,
    wwidth: i32,
    dist: i32,
    adjacency_arg: &str,
    why: &str,
    wide: bool,
) -> Result<i32, RuleError> {
    let (set1, pmask1, multi1) = spacing_layers(c, layers1, LayerRole::First)?;
    let (set2, pmask2, multi2) = spacing_layers(c, layers2, LayerRole::Second)?;
    let multiplane = multi1 || multi2;
    let adjacency = adjacency(c, adjacency_arg, multiplane, pmask1 & pmask2, wide)?;
    let why = c.why(why);

    let rule = Spacing {
        set1,
        set2,
        pmask1,
        pmask2,
        wwidth,
        dist,
        adjacency,
        wide,
        why,
    };
    if !multiplane {
        return Ok(mask_spacing(c, &rule));
    }

    // Compile each pair of populated planes separately.
    let mut max = 0;
    for p in pmask1.iter() {
        for p2 in pmask2.iter() {
            let pair = Spacing {
                set1: set1 & c.plane_types(p),
                set2: set2 & c.plane_types(p2),
                pmask1: PlaneMask::bit(p),
                pmask2: PlaneMask::bit(p2),
                ..rule
            };
            let d = mask_spacing(c, &pair);
            if !c.config.spacing_all_plane_pairs {
                return Ok(d);
            }
            max = max.max(d);
        }
    }
    Ok(max)
}

fn trigger_pair(trigger: EdgeRule, rule: EdgeRule) -> Rule {
    Rule::Triggered { trigger, rule }
}

/// Compiles a spacing rule whose sets each lie on coincident planes.
fn mask_spacing(c: &mut Compiler<'_>, s: &Spacing) -> i32 {
    let Spacing {
        set1,
        set2,
        wwidth,
        dist,
        wide,
        why,
        ..
    } = *s;
    let needtrigger = s.adjacency == Adjacency::SurroundOk;
    let mut need_reverse = wide;

    let (set_r, set_r_rev, pmask1, pmask2) = if s.adjacency == Adjacency::TouchingOk {
        // Edges between the two sets are fine, so neither side checks the other.
        if set1 != set2 {
            need_reverse = true;
        }
        let r = !set1 & !set2;
        let planes = s.pmask1 & s.pmask2;
        (r, r, planes, planes)
    } else {
        (!set1, !set2, s.pmask1, s.pmask2)
    };

    for (i, j) in type_pairs(c.tech) {
        // Edges from the first set looking for the second.
        let pset = c.shared(i, j, pmask1);
        if !pset.is_empty() && set1.contains(i) && set_r.contains(j) {
            let plane = c.lowest(pset);
            let plane2 = c.lowest(pmask2);
            let tmp1 = c.plane_types(plane2) & !set2;
            let tmp2 = c.plane_types(plane) & set_r;

            let unit = |direction: Direction| {
                let mut rule = if wide {
                    EdgeRule::new(direction, dist, dist, tmp1, tmp2, why)
                } else {
                    EdgeRule::new(direction, dist, wwidth, tmp1, tmp2, why)
                }
                .on(plane2, plane);
                if need_reverse || needtrigger {
                    rule = rule.with_both_corners();
                }
                let reverse = match direction {
                    Direction::Forward => Direction::Reverse,
                    Direction::Reverse => Direction::Forward,
                };
                if wide {
                    trigger_pair(
                        EdgeRule::new(reverse, wwidth, wwidth, set1, set1, why)
                            .on(plane2, plane)
                            .with_kind(RuleKind::MaxWidth { bends: true }),
                        rule,
                    )
                } else if needtrigger {
                    trigger_pair(
                        EdgeRule::new(direction, 1, 1, set2, tmp2, why).on(plane2, plane),
                        rule,
                    )
                } else {
                    Rule::Simple(rule)
                }
            };
            c.insert(i, j, unit(Direction::Forward));
            if need_reverse {
                c.insert(j, i, unit(Direction::Reverse));
            }
        }

        if set1 == set2 || wide {
            continue;
        }

        // Edges from the second set looking for the first.
        let pset = c.shared(i, j, pmask2);
        if !pset.is_empty() && set2.contains(i) && set_r_rev.contains(j) {
            let plane = c.lowest(pset);
            let plane2 = c.lowest(pmask1);
            let tmp1 = c.plane_types(plane2) & !set1;
            let tmp2 = c.plane_types(plane) & set_r_rev;

            let unit = |direction: Direction| {
                let mut rule =
                    EdgeRule::new(direction, dist, dist, tmp1, tmp2, why).on(plane2, plane);
                if need_reverse || needtrigger {
                    rule = rule.with_both_corners();
                }
                if needtrigger {
                    trigger_pair(
                        EdgeRule::new(direction, 1, 1, set1, tmp2, why).on(plane2, plane),
                        rule,
                    )
                } else {
                    Rule::Simple(rule)
                }
            };
            c.insert(i, j, unit(Direction::Forward));
            if need_reverse {
                c.insert(j, i, unit(Direction::Reverse));
            }
        }

        if needtrigger {
            continue;
        }

        // The first set on another plane than the second must not sit
        // under the second set's plane unless it is covered.
        let pset = c.shared(i, j, pmask1);
        if !pset.is_empty() && set_r.contains(i) && set1.contains(j) {
            let plane = c.lowest(pset);
            let plane2 = c.lowest(pmask2);
            let far = if i == TileType::SPACE { j } else { i };
            if c.tech.type_on_plane(far, plane2) {
                continue;
            }
            let tmp1 = c.plane_types(plane2) & !set2;
            c.insert(
                i,
                j,
                EdgeRule::new(Direction::Forward, 1, dist, tmp1, TypeMask::EMPTY, why)
                    .on(plane2, plane),
            );
        }
    }
    wwidth.max(dist)
}

/// `spacing layers1 layers2 separation corner_ok layers3 why`
///
/// Like a touching-illegal spacing rule, except that corners formed with
/// the third set are exempt.
fn corner_ok(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set1, planes1) = c.layers(argv[1])?;
    let (set2, planes2) = c.layers(argv[2])?;
    let dist = c.distance(argv[3])?;
    let (set3, planes3) = c.layers(argv[5])?;
    let pmask = c.coincident(&set1, planes1)
        & c.coincident(&set2, planes2)
        & c.coincident(&set3, planes3);
    if pmask.is_empty() {
        return Err(RuleError::CornerOkNotCoplanar);
    }
    let why = c.why(argv[6]);

    let ok = !set2;
    let corner = !(set3 | set1);
    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask);
        if pset.is_empty() || !set1.contains(i) || !corner.contains(j) {
            continue;
        }
        let plane = c.lowest(pset);
        c.insert(
            i,
            j,
            EdgeRule::new(Direction::Forward, dist, dist, ok, corner, why)
                .on(plane, plane)
                .with_both_corners(),
        );
        c.insert(
            j,
            i,
            EdgeRule::new(Direction::Reverse, dist, dist, ok, corner, why)
                .on(plane, plane)
                .with_both_corners(),
        );
    }
    Ok(dist)
}
