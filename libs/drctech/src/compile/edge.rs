//! Edge rules and the rules built from them.

use crate::diagnostics::Cause;
use crate::error::{LayerRole, RuleError};
use crate::rule::{Direction, EdgeRule, Rule};
use crate::types::{PlaneMask, TileType, TypeMask};

use super::{type_pairs, Compiler};

/// `edge layers1 layers2 distance okTypes cornerTypes cornerDistance why [plane]`
pub(super) fn edge(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    compile_edge(c, argv, false)
}

/// Like [`edge`], but checked in both directions with both corners.
pub(super) fn edge4way(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    compile_edge(c, argv, true)
}

fn compile_edge(c: &mut Compiler<'_>, argv: &[&str], fourway: bool) -> Result<i32, RuleError> {
    let (set1, planes1) = c.layers(argv[1])?;
    let (set2, planes2) = c.layers(argv[2])?;
    let pmask1 = c.coincident(&set1, planes1) & c.coincident(&set2, planes2);
    if pmask1.is_empty() {
        return Err(RuleError::EdgeNotCoplanar);
    }
    let dist = c.distance(argv[3])?;
    let (set_c, planes_c) = c.layers(argv[5])?;
    if (c.coincident(&set_c, planes_c) & pmask1).is_empty() {
        return Err(RuleError::CornerTypesOffPlane);
    }
    let cdist = c.distance(argv[6])?;
    let (set_m, planes_m) = c.layers(argv[4])?;

    let space_only = set_m == TypeMask::single(TileType::SPACE);
    let mut pmask_m = c.coincident(&set_m, planes_m);
    if pmask_m.is_empty() || set_m.is_empty() || space_only {
        if !space_only && !set_m.is_empty() {
            return Err(RuleError::OkTypesNotCoplanar);
        }
        pmask_m = pmask1;
    }

    if set1.intersects(&set2) {
        c.warn(Cause::OverlappingEdgeSets);
    }
    // The plane argument is only consulted when space alone is ok.
    if let Some(name) = argv.get(8) {
        match c.tech.plane_by_name(name) {
            Some(plane) if space_only => pmask_m = PlaneMask::bit(plane),
            Some(plane) if PlaneMask::bit(plane) == pmask_m => {}
            _ => c.warn(Cause::IgnoredPlaneArgument {
                plane: (*name).into(),
            }),
        }
    } else if space_only {
        let plane = c.tech.plane_name(c.lowest(pmask1)).into();
        c.warn(Cause::AmbiguousOkTypes {
            ok_types: argv[4].into(),
            plane,
        });
    }
    let why = c.why(argv[7]);

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask1);
        if pset.is_empty() || !set1.contains(i) || !set2.contains(j) {
            continue;
        }
        let (check, plane) = if (pset & pmask_m).is_empty() {
            (c.lowest(pmask_m), c.lowest(pset))
        } else {
            let plane = c.lowest(pset & pmask_m);
            (plane, plane)
        };
        let rule = EdgeRule::new(Direction::Forward, dist, cdist, set_m, set_c, why)
            .on(check, plane);
        if !fourway {
            c.insert(i, j, rule);
            continue;
        }
        c.insert(i, j, rule.with_both_corners());
        c.insert(
            j,
            i,
            EdgeRule::new(Direction::Reverse, dist, cdist, set_m, set_c, why)
                .on(check, plane)
                .with_both_corners(),
        );
    }
    Ok(dist.max(cdist))
}

/// `extend layers1 layers2 distance [exact_width] why`
///
/// Requires the first set to extend at least `distance` past an edge of
/// the second set. With `exact_width` the extension must be exactly that.
pub(super) fn extend(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let dist = c.distance(argv[3])?;
    let (exact, why) = if argv.len() == 6 {
        if !argv[4].starts_with("exact_") {
            return Err(RuleError::BadExtendOption {
                found: argv[4].into(),
            });
        }
        (true, argv[5])
    } else if argv[4].starts_with("exact_") {
        return Err(c.usage_error());
    } else {
        (false, argv[4])
    };

    let (set1, pmask1) = c.coplanar(argv[1], LayerRole::First)?;
    let set_n = !set1;
    let (set2, pmask2) = c.coplanar(argv[2], LayerRole::Second)?;
    let set_c = !set2;
    let why = c.why(why);

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask2);
        if pset.is_empty() {
            continue;
        }
        if !(pset & pmask1).is_empty() {
            if !set2.contains(i) || !set1.contains(j) {
                continue;
            }
            let plane = c.lowest(pset & pmask1);
            for (from, to, direction) in [(i, j, Direction::Forward), (j, i, Direction::Reverse)] {
                c.insert(
                    from,
                    to,
                    EdgeRule::new(direction, dist, 0, set1, TypeMask::EMPTY, why)
                        .on(plane, plane),
                );
            }
            if exact {
                for (from, to, direction) in
                    [(i, j, Direction::Forward), (j, i, Direction::Reverse)]
                {
                    c.insert(
                        from,
                        to,
                        EdgeRule::new(direction, dist, 0, set_n, TypeMask::EMPTY, why)
                            .on(plane, plane)
                            .with_outside(),
                    );
                }
            }
        } else if set2.contains(i) && set_c.contains(j) {
            // The first set is on another plane, so only check it where it
            // starts at the edge.
            let plane = c.lowest(pset);
            let plane2 = c.lowest(pmask1);
            for (from, to, direction) in [(i, j, Direction::Forward), (j, i, Direction::Reverse)] {
                c.insert(
                    from,
                    to,
                    Rule::Triggered {
                        trigger: EdgeRule::new(direction, 1, 0, set_n, TypeMask::EMPTY, why)
                            .on(plane2, plane),
                        rule: EdgeRule::new(direction, dist, 0, set1, TypeMask::EMPTY, why)
                            .on(plane2, plane),
                    },
                );
            }
        }
    }
    Ok(dist)
}

/// `overhang layers2 layers1 distance why`
///
/// Requires the second set to extend at least `distance` past the first
/// set wherever the first set's edge leaves the second.
pub(super) fn overhang(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let dist = c.distance(argv[3])?;
    let (set1, pmask1) = c.coplanar(argv[2], LayerRole::First)?;
    let set_n = !set1;
    let (mut set2, pmask2) = c.coplanar(argv[1], LayerRole::Second)?;
    let set2_inv = !set2;
    if set1.intersects(&set2) {
        c.warn(Cause::OverlappingOverhangSets);
    }
    let set_m = set1 | set2;
    set2.insert(TileType::SPACE);
    let why = c.why(argv[4]);

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask2);
        if pset.is_empty() {
            continue;
        }
        if !(pset & pmask1).is_empty() {
            if !set1.contains(i) || !set2.contains(j) {
                continue;
            }
            let plane = c.lowest(pset);
            for (from, to, direction) in [(i, j, Direction::Forward), (j, i, Direction::Reverse)] {
                c.insert(
                    from,
                    to,
                    EdgeRule::new(direction, dist, dist, set_m, set_m, why)
                        .on(plane, plane)
                        .with_both_corners(),
                );
            }
        } else if set2.contains(i) && set2_inv.contains(j) {
            let plane = c.lowest(pset);
            let plane2 = c.lowest(pmask1);
            for (from, to, direction) in [(i, j, Direction::Forward), (j, i, Direction::Reverse)] {
                c.insert(
                    from,
                    to,
                    Rule::Triggered {
                        trigger: EdgeRule::new(direction, 1, 0, set_n, TypeMask::EMPTY, why)
                            .on(plane2, plane),
                        rule: EdgeRule::new(direction, dist, dist, set1, set1, why)
                            .on(plane2, plane),
                    },
                );
            }
        }
    }
    Ok(dist)
}
