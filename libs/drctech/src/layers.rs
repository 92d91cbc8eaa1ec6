//! Layer-set expressions.
//!
//! A layer expression selects a set of tile types, for example
//! `~(poly,*m1)/active,ndiff`. Items are separated by commas. A leading `~`
//! complements an item, parentheses group, `/plane` restricts an item to the
//! types on one plane, and `*name` adds every contact having `name` as a
//! residue. The name `0` selects nothing.

use arcstr::ArcStr;
use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::combinator::{all_consuming, map, opt};
use nom::multi::separated_list0;
use nom::sequence::{delimited, preceded};
use nom::IResult;

use crate::error::LayerExprError;
use crate::tech::TechDb;
use crate::types::{PlaneMask, TileType, TypeMask};

#[derive(Clone, Debug, Eq, PartialEq)]
struct Item<'a> {
    complement: bool,
    atom: Atom<'a>,
    plane: Option<&'a str>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Atom<'a> {
    Name { name: &'a str, with_contacts: bool },
    Group(Vec<Item<'a>>),
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !matches!(c, ',' | '(' | ')' | '/' | '~' | '*') && !c.is_whitespace())(
        input,
    )
}

fn named(input: &str) -> IResult<&str, Atom<'_>> {
    let (input, star) = opt(char('*'))(input)?;
    let (input, name) = name(input)?;
    Ok((
        input,
        Atom::Name {
            name,
            with_contacts: star.is_some(),
        },
    ))
}

fn group(input: &str) -> IResult<&str, Atom<'_>> {
    map(delimited(char('('), list, char(')')), Atom::Group)(input)
}

fn item(input: &str) -> IResult<&str, Item<'_>> {
    let (input, tilde) = opt(char('~'))(input)?;
    let (input, atom) = alt((group, named))(input)?;
    let (input, plane) = opt(preceded(char('/'), name))(input)?;
    Ok((
        input,
        Item {
            complement: tilde.is_some(),
            atom,
            plane,
        },
    ))
}

fn list(input: &str) -> IResult<&str, Vec<Item<'_>>> {
    map(separated_list0(char(','), opt(item)), |items| {
        items.into_iter().flatten().collect()
    })(input)
}

fn parse(expr: &str) -> Result<Vec<Item<'_>>, LayerExprError> {
    let mut depth = 0i32;
    for c in expr.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => (),
        }
        if depth < 0 {
            break;
        }
    }
    if depth != 0 {
        return Err(LayerExprError::UnmatchedParen { expr: expr.into() });
    }
    all_consuming(list)(expr)
        .map(|(_, items)| items)
        .map_err(|_| LayerExprError::Syntax { expr: expr.into() })
}

/// Evaluates a list, applying the "nothing or only space means every plane" rule.
fn eval_list(tech: &TechDb, items: &[Item<'_>]) -> Result<(TypeMask, PlaneMask), LayerExprError> {
    let mut mask = TypeMask::EMPTY;
    let mut planes = PlaneMask::EMPTY;
    for item in items {
        let (mut m, inner_planes) = match &item.atom {
            Atom::Group(items) => eval_list(tech, items)?,
            Atom::Name {
                name,
                with_contacts,
            } => (lookup(tech, name, *with_contacts)?, PlaneMask::EMPTY),
        };
        if item.complement {
            m = !m;
        }
        if let Some(plane) = item.plane {
            let plane = tech
                .plane_by_name(plane)
                .ok_or_else(|| LayerExprError::UnknownPlane { name: plane.into() })?;
            m &= tech.plane_types(plane);
            planes |= PlaneMask::bit(plane);
        } else {
            planes |= inner_planes;
            planes |= m
                .iter(tech.num_types())
                .filter(|t| !t.is_reserved())
                .fold(PlaneMask::EMPTY, |acc, t| acc | tech.planes_of(t));
        }
        mask |= m;
    }

    if planes.is_empty() && (mask.is_empty() || mask == TypeMask::single(TileType::SPACE)) {
        planes = tech.planes_of(TileType::SPACE);
    }
    Ok((mask, planes))
}

fn lookup(tech: &TechDb, name: &str, with_contacts: bool) -> Result<TypeMask, LayerExprError> {
    if name == "0" {
        return Ok(TypeMask::EMPTY);
    }
    let t = tech
        .type_by_name(name)
        .ok_or_else(|| LayerExprError::UnknownName {
            name: ArcStr::from(name),
        })?;
    let mut mask = TypeMask::single(t);
    if with_contacts {
        mask |= tech.contacts_with_residue(t);
    }
    Ok(mask)
}

/// Parses `expr`, returning the selected types and the planes they were named on.
///
/// The plane mask is the union of the planes of the named technology types,
/// or the qualifying plane for `/plane` items. When nothing but space is
/// selected and no plane is named, every plane is returned.
pub fn name_mask(tech: &TechDb, expr: &str) -> Result<(TypeMask, PlaneMask), LayerExprError> {
    let items = parse(expr)?;
    eval_list(tech, &items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaneId;

    fn tech() -> TechDb {
        let mut b = TechDb::builder();
        b.add_plane("active", &[]).unwrap();
        b.add_plane("metal1", &[]).unwrap();
        b.add_layer("poly", "active", &[]).unwrap();
        b.add_layer("ndiff", "active", &["nd"]).unwrap();
        b.add_layer("m1", "metal1", &[]).unwrap();
        b.add_contact("pc", &["poly", "m1"], &[]).unwrap();
        b.build()
    }

    fn types(tech: &TechDb, names: &[&str]) -> TypeMask {
        names
            .iter()
            .map(|n| tech.type_by_name(n).unwrap())
            .collect()
    }

    #[test]
    fn parses_nested_items() {
        let items = parse("~(a,*b)/p,c").unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].complement);
        assert_eq!(items[0].plane, Some("p"));
        assert_eq!(
            items[1].atom,
            Atom::Name {
                name: "c",
                with_contacts: false
            }
        );
        assert_eq!(parse(",a,,b,").unwrap().len(), 2);
    }

    #[test]
    fn simple_names_and_aliases() {
        let tech = tech();
        let (mask, planes) = name_mask(&tech, "poly,nd").unwrap();
        assert_eq!(mask, types(&tech, &["poly", "ndiff"]));
        assert_eq!(planes, PlaneMask::bit(PlaneId::new(0)));
    }

    #[test]
    fn residue_expansion() {
        let tech = tech();
        let (mask, planes) = name_mask(&tech, "*m1").unwrap();
        assert_eq!(mask, types(&tech, &["m1", "pc"]));
        assert_eq!(planes, tech.all_planes());
    }

    #[test]
    fn complement_restricted_to_plane() {
        let tech = tech();
        let active = PlaneId::new(0);
        let (mask, planes) = name_mask(&tech, "~(poly)/active").unwrap();
        assert_eq!(mask, types(&tech, &["space", "ndiff", "pc"]));
        assert_eq!(planes, PlaneMask::bit(active));
    }

    #[test]
    fn empty_and_space_select_every_plane() {
        let tech = tech();
        let (mask, planes) = name_mask(&tech, "0").unwrap();
        assert!(mask.is_empty());
        assert_eq!(planes, tech.all_planes());

        let (mask, planes) = name_mask(&tech, "space").unwrap();
        assert_eq!(mask, TypeMask::single(TileType::SPACE));
        assert_eq!(planes, tech.all_planes());

        let (_, planes) = name_mask(&tech, "space/metal1").unwrap();
        assert_eq!(planes, PlaneMask::bit(PlaneId::new(1)));
    }

    #[test]
    fn qualified_items_union_their_planes() {
        let tech = tech();
        let (mask, planes) = name_mask(&tech, "pc/active,pc/metal1").unwrap();
        assert_eq!(mask, types(&tech, &["pc"]));
        assert_eq!(planes, tech.all_planes());
    }

    #[test]
    fn errors() {
        let tech = tech();
        assert_eq!(
            name_mask(&tech, "poly,bogus"),
            Err(LayerExprError::UnknownName {
                name: "bogus".into()
            })
        );
        assert_eq!(
            name_mask(&tech, "poly/bogus"),
            Err(LayerExprError::UnknownPlane {
                name: "bogus".into()
            })
        );
        assert!(matches!(
            name_mask(&tech, "(poly,m1"),
            Err(LayerExprError::UnmatchedParen { .. })
        ));
        assert!(matches!(
            name_mask(&tech, "poly)"),
            Err(LayerExprError::UnmatchedParen { .. })
        ));
        assert!(matches!(
            name_mask(&tech, "poly m1"),
            Err(LayerExprError::Syntax { .. })
        ));
    }
}
