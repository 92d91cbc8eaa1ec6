//! Surround rules.

use crate::error::{LayerRole, RuleError};
use crate::rule::{Direction, EdgeRule, Rule};
use crate::types::TypeMask;

use super::{type_pairs, Compiler};

/// How the outside types must be present around the inside types.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Presence {
    /// The surround must be exactly the distance, and is required.
    Exact,
    /// The distance must be met in one direction only.
    Directional,
    /// The outside types are required.
    AbsenceIllegal,
    /// The outside types may be absent.
    AbsenceOk,
}

impl Presence {
    fn parse(value: &str) -> Option<Self> {
        if value.starts_with("exact_") {
            Some(Self::Exact)
        } else if value.starts_with("directional") {
            Some(Self::Directional)
        } else if value == "absence_illegal" {
            Some(Self::AbsenceIllegal)
        } else if value == "absence_ok" {
            Some(Self::AbsenceOk)
        } else {
            None
        }
    }
}

/// `surround layers1 layers2 distance presence why`
///
/// Requires the second set to surround the first by at least `distance`.
pub(super) fn surround(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set_m, pmask) = c.coplanar(argv[1], LayerRole::Inside)?;
    let (set2, pmask2) = c.coplanar(argv[2], LayerRole::Outside)?;
    let dist = c.distance(argv[3])?;
    let presence = Presence::parse(argv[4]).ok_or_else(|| RuleError::BadPresence {
        found: argv[4].into(),
    })?;
    let why = c.why(argv[5]);

    let set_r = set_m | set2;
    let inv_m = !set_m;
    let set1 = !set2;

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask2);
        if pset.is_empty() {
            continue;
        }
        let plane1 = c.lowest(pmask);
        let plane2 = c.lowest(pset);
        if presence == Presence::Directional {
            if !set_m.contains(i) || !inv_m.contains(j) {
                continue;
            }
            // Triggered on the inside edge, checked back across it.
            for (from, to, direction, back) in [
                (i, j, Direction::Forward, Direction::Reverse),
                (j, i, Direction::Reverse, Direction::Forward),
            ] {
                c.insert(
                    from,
                    to,
                    Rule::Triggered {
                        trigger: EdgeRule::new(direction, dist, 0, set2, TypeMask::EMPTY, why)
                            .on(plane1, plane2),
                        rule: EdgeRule::new(back, dist, dist, set_r, TypeMask::ALL, why)
                            .on(plane1, plane2)
                            .with_both_corners(),
                    },
                );
            }
        } else {
            if !set1.contains(i) || !set2.contains(j) {
                continue;
            }
            for (from, to, direction) in [(i, j, Direction::Forward), (j, i, Direction::Reverse)] {
                c.insert(
                    from,
                    to,
                    EdgeRule::new(direction, dist, dist, inv_m, set2, why)
                        .on(plane1, plane2)
                        .with_both_corners(),
                );
            }
        }
    }

    if presence == Presence::Exact {
        // Anything beyond the surround on the outside must not be more of it.
        for (i, j) in type_pairs(c.tech) {
            let pset = c.shared(i, j, pmask);
            if pset.is_empty() || !set_m.contains(i) || !set2.contains(j) {
                continue;
            }
            let plane = c.lowest(pset);
            for (from, to, direction) in [(i, j, Direction::Forward), (j, i, Direction::Reverse)] {
                c.insert(
                    from,
                    to,
                    EdgeRule::new(direction, dist, dist, set1, set2, why)
                        .on(plane, plane)
                        .with_both_corners()
                        .with_outside(),
                );
            }
        }
    }

    if !matches!(presence, Presence::Exact | Presence::AbsenceIllegal) {
        return Ok(dist);
    }

    // The outside types must be present at every edge of the inside types.
    let common = pmask & pmask2;
    if !common.is_empty() {
        let corner = !(set_m | set2);
        for (i, j) in type_pairs(c.tech) {
            let pset = c.shared(i, j, common);
            if pset.is_empty() || !set_m.contains(i) || !corner.contains(j) {
                continue;
            }
            let plane = c.lowest(pset);
            for (from, to, direction) in [(i, j, Direction::Forward), (j, i, Direction::Reverse)] {
                c.insert(
                    from,
                    to,
                    EdgeRule::new(direction, dist, dist, TypeMask::EMPTY, corner, why)
                        .on(plane, plane)
                        .with_both_corners(),
                );
            }
        }
    } else {
        let check = c.lowest(pmask2);
        for (i, j) in type_pairs(c.tech) {
            let pset = c.shared(i, j, pmask);
            if pset.is_empty() || !set_m.contains(i) || !inv_m.contains(j) {
                continue;
            }
            let plane = c.lowest(pset);
            for (from, to, direction) in [(i, j, Direction::Forward), (j, i, Direction::Reverse)] {
                c.insert(
                    from,
                    to,
                    EdgeRule::new(direction, dist, dist, set2, inv_m, why)
                        .on(check, plane)
                        .with_both_corners(),
                );
            }
        }
    }
    Ok(dist)
}
