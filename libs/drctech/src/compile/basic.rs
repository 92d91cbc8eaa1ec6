//! Single-layer rules and the rules that do not produce edge rules.

use crate::diagnostics::Cause;
use crate::error::{LayerRole, RuleError};
use crate::rule::{AngleLimit, Direction, EdgeRule, Parity, RuleKind};
use crate::types::{TileType, TypeMask};

use super::{type_pairs, Compiler};

/// `width layers width why`
pub(super) fn width(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set, pmask) = c.coplanar(argv[1], LayerRole::Layers)?;
    let dist = c.distance(argv[2])?;
    let why = c.why(argv[3]);

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask);
        if pset.is_empty() || set.contains(i) || !set.contains(j) {
            continue;
        }
        let plane = c.lowest(pset);
        c.insert(
            i,
            j,
            EdgeRule::new(Direction::Forward, dist, dist, set, set, why).on(plane, plane),
        );
    }
    Ok(dist)
}

/// `area layers area horizon why`
pub(super) fn area(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set, pmask) = c.coplanar(argv[1], LayerRole::Layers)?;
    let area = c.distance(argv[2])?;
    let horizon = c.distance(argv[3])?;
    let why = c.why(argv[4]);

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask);
        if pset.is_empty() || set.contains(i) || !set.contains(j) {
            continue;
        }
        let plane = c.lowest(pset);
        c.insert(
            i,
            j,
            EdgeRule::new(Direction::Forward, horizon, area, set, set, why)
                .on(plane, plane)
                .with_kind(RuleKind::Area),
        );
    }
    Ok(horizon)
}

/// `maxwidth layers maxWidth [bend_illegal|bend_ok] why`
pub(super) fn max_width(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set, pmask) = c.coplanar(argv[1], LayerRole::Layers)?;
    let dist = c.distance(argv[2])?;
    let (bends, why) = if argv.len() == 4 {
        (true, argv[3])
    } else {
        match argv[3] {
            "bend_illegal" => (false, argv[4]),
            "bend_ok" => (true, argv[4]),
            other => return Err(RuleError::BadBend { found: other.into() }),
        }
    };
    // A zero width never needs the bend search.
    let bends = bends && dist != 0;
    let why = c.why(why);

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask);
        if pset.is_empty() || set.contains(i) || !set.contains(j) {
            continue;
        }
        let plane = c.lowest(pset);
        c.insert(
            i,
            j,
            EdgeRule::new(Direction::Forward, dist, dist, set, set, why)
                .on(plane, plane)
                .with_kind(RuleKind::MaxWidth { bends }),
        );
    }
    Ok(dist)
}

/// `angles layers 45|90 why`
///
/// Angle rules are attached to the edges between space and each type.
pub(super) fn angles(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set, _) = c.layers(argv[1])?;
    let limit = match c.integer(argv[2])? {
        45 => AngleLimit::Octilinear,
        90 => AngleLimit::Manhattan,
        found => return Err(RuleError::BadAngle { found }),
    };
    let why = c.why(argv[3]);

    let tech = c.tech;
    for t in set.iter(tech.num_types()).filter(|t| !t.is_reserved()) {
        let plane = tech.home_plane(t);
        c.insert(
            TileType::SPACE,
            t,
            EdgeRule::new(Direction::Forward, 1, 1, set, set, why)
                .on(plane, plane)
                .with_kind(RuleKind::Angles { limit }),
        );
    }
    Ok(1)
}

/// `rect_only layers why`
pub(super) fn rect_only(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set1, pmask) = c.coplanar(argv[1], LayerRole::Layers)?;
    let set2 = !set1;
    let why = c.why(argv[2]);

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask);
        if pset.is_empty() || !set1.contains(i) || !set2.contains(j) {
            continue;
        }
        let plane = c.lowest(pset);
        let corner = c.plane_types(plane);
        // Any corner type at all is a violation of a rectangle.
        c.insert(
            i,
            j,
            EdgeRule::new(Direction::Forward, 1, 1, set2, corner, why)
                .on(plane, plane)
                .with_both_corners(),
        );
        c.insert(
            j,
            i,
            EdgeRule::new(Direction::Reverse, 1, 1, set2, corner, why)
                .on(plane, plane)
                .with_both_corners(),
        );
    }
    Ok(1)
}

fn parse_parity(value: &str) -> Option<Parity> {
    const PARITIES: [(&str, Parity); 3] = [
        ("any", Parity::Any),
        ("even", Parity::Even),
        ("odd", Parity::Odd),
    ];
    if value.is_empty() {
        return None;
    }
    PARITIES
        .iter()
        .find(|(name, _)| name.starts_with(value))
        .map(|(_, parity)| *parity)
}

/// `rectangle layers maxwidth [even|odd|any] why`
pub(super) fn rectangle(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (types, pmask) = c.coplanar(argv[1], LayerRole::Layers)?;
    let not_types = !types;
    let max_width = c.distance(argv[2])?;
    let parity = parse_parity(argv[3]).ok_or_else(|| RuleError::BadParity {
        found: argv[3].into(),
    })?;
    let why = c.why(argv[4]);

    for (i, j) in type_pairs(c.tech) {
        let pset = c.shared(i, j, pmask);
        if pset.is_empty() || !types.contains(i) || !not_types.contains(j) {
            continue;
        }
        let plane = c.lowest(pset);
        c.insert(
            i,
            j,
            EdgeRule::new(Direction::Forward, 1, 1, not_types, TypeMask::ALL, why)
                .on(plane, plane),
        );
        c.insert(
            j,
            i,
            EdgeRule::new(Direction::Reverse, 1, 1, not_types, TypeMask::ALL, why)
                .on(plane, plane),
        );
        if max_width > 0 {
            c.insert(
                j,
                i,
                EdgeRule::new(
                    Direction::Forward,
                    max_width,
                    0,
                    types,
                    TypeMask::EMPTY,
                    why,
                )
                .on(plane, plane)
                .with_kind(RuleKind::RectSize { parity }),
            );
        }
    }
    Ok(max_width)
}

/// `stepsize step_size`
pub(super) fn step_size(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let value = c.integer(argv[1])?;
    if value <= 0 {
        c.error(Cause::BadStepSize { value });
        c.style.step_size = 0;
    } else {
        if value < c.config.small_step_size_warning {
            c.warn(Cause::SmallStepSize { value });
        }
        c.style.step_size = value;
    }
    Ok(0)
}

/// `no_overlap layers1 layers2`
///
/// Makes every overlap of the two sets illegal on every plane.
pub(super) fn no_overlap(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set1, _) = c.layers(argv[1])?;
    let (set2, _) = c.layers(argv[2])?;

    let tech = c.tech;
    for i in set1.iter(tech.num_types()) {
        for j in set2.iter(tech.num_types()) {
            for plane in tech.all_planes().iter() {
                c.style.paint.set(plane, i, j, TileType::ERROR);
                c.style.paint.set(plane, j, i, TileType::ERROR);
            }
        }
    }
    Ok(0)
}

/// `exact_overlap layers`
pub(super) fn exact_overlap(c: &mut Compiler<'_>, argv: &[&str]) -> Result<i32, RuleError> {
    let (set, _) = c.layers(argv[1])?;
    c.style.exact_overlap |= set;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_accepts_prefixes() {
        assert_eq!(parse_parity("ev"), Some(Parity::Even));
        assert_eq!(parse_parity("odd"), Some(Parity::Odd));
        assert_eq!(parse_parity("a"), Some(Parity::Any));
        assert_eq!(parse_parity("none"), None);
        assert_eq!(parse_parity(""), None);
    }
}
