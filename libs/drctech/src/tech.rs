//! The tile-type and plane database consulted by the rule compilers.
//!
//! A [`TechDb`] is immutable once built. Space lives on every plane and the
//! error type lives on none. Every other type is either a layer with a single
//! home plane or a contact whose planes are the union of its residues' planes.

use std::collections::HashMap;
use std::path::Path;

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TechDbError};
use crate::types::{lowest_plane, PlaneId, PlaneMask, TileType, TypeMask, MAX_PLANES, MAX_TYPES};

#[derive(Clone, Debug)]
struct TypeInfo {
    name: ArcStr,
    kind: TypeKind,
    planes: PlaneMask,
}

#[derive(Clone, Debug)]
enum TypeKind {
    Reserved,
    Layer,
    Contact { residues: TypeMask },
}

/// An immutable tile-type and plane database.
#[derive(Clone, Debug)]
pub struct TechDb {
    planes: Vec<ArcStr>,
    types: Vec<TypeInfo>,
    type_names: IndexMap<ArcStr, TileType>,
    plane_names: IndexMap<ArcStr, PlaneId>,
    paint: HashMap<(PlaneId, TileType, TileType), TileType>,
}

impl TechDb {
    /// Creates a new [`TechDbBuilder`].
    #[inline]
    pub fn builder() -> TechDbBuilder {
        TechDbBuilder::new()
    }

    /// The number of tile types, including space and the error type.
    #[inline]
    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    /// The number of planes.
    #[inline]
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// The set of every declared plane.
    #[inline]
    pub fn all_planes(&self) -> PlaneMask {
        PlaneMask::first(self.num_planes())
    }

    /// Iterates over every tile type, space first.
    pub fn types(&self) -> impl Iterator<Item = TileType> {
        (0..self.num_types()).map(TileType::new)
    }

    /// The planes on which `t` lives.
    pub fn planes_of(&self, t: TileType) -> PlaneMask {
        self.types
            .get(t.index())
            .map(|info| info.planes)
            .unwrap_or(PlaneMask::EMPTY)
    }

    /// The planes on which both `i` and `j` live.
    #[inline]
    pub fn types_on_same_plane(&self, i: TileType, j: TileType) -> PlaneMask {
        self.planes_of(i) & self.planes_of(j)
    }

    /// Returns `true` if `t` lives on `plane`.
    #[inline]
    pub fn type_on_plane(&self, t: TileType, plane: PlaneId) -> bool {
        self.planes_of(t).contains(plane)
    }

    /// Every type living on `plane`, space included.
    ///
    /// Returns the empty set for an undeclared plane.
    pub fn plane_types(&self, plane: PlaneId) -> TypeMask {
        self.types()
            .filter(|t| self.type_on_plane(*t, plane))
            .collect()
    }

    /// The plane a type is drawn on.
    ///
    /// For contacts this is the lowest of the residue planes. The error type
    /// has no plane and yields the `num_planes` sentinel.
    #[inline]
    pub fn home_plane(&self, t: TileType) -> PlaneId {
        lowest_plane(self.planes_of(t), self.num_planes())
    }

    /// Returns `true` if `t` is a contact.
    pub fn is_contact(&self, t: TileType) -> bool {
        matches!(
            self.types.get(t.index()).map(|info| &info.kind),
            Some(TypeKind::Contact { .. })
        )
    }

    /// The residue layers of `t`.
    ///
    /// A layer is its own only residue.
    pub fn residues(&self, t: TileType) -> TypeMask {
        match self.types.get(t.index()).map(|info| &info.kind) {
            Some(TypeKind::Contact { residues }) => *residues,
            Some(_) => TypeMask::single(t),
            None => TypeMask::EMPTY,
        }
    }

    /// The type itself together with its residues.
    #[inline]
    pub fn layer_mask(&self, t: TileType) -> TypeMask {
        self.residues(t) | TypeMask::single(t)
    }

    /// Every contact having `t` as a residue.
    pub fn contacts_with_residue(&self, t: TileType) -> TypeMask {
        self.types()
            .filter(|c| self.is_contact(*c) && self.residues(*c).contains(t))
            .collect()
    }

    /// The type resulting from painting `paint` over `have` on `plane`.
    ///
    /// Explicit overrides win. Otherwise painting space or the error type
    /// leaves `have` unchanged, and painting a type living on `plane`
    /// replaces `have`.
    pub fn paint_result(&self, plane: PlaneId, paint: TileType, have: TileType) -> TileType {
        if let Some(result) = self.paint.get(&(plane, paint, have)) {
            return *result;
        }
        if have == TileType::ERROR {
            return have;
        }
        if paint.is_reserved() || !self.type_on_plane(paint, plane) {
            have
        } else {
            paint
        }
    }

    /// Returns `true` if painting `paint` can affect a plane of `have`.
    #[inline]
    pub fn paint_on_type_planes(&self, paint: TileType, have: TileType) -> bool {
        !self.types_on_same_plane(paint, have).is_empty()
    }

    /// Looks up a type by name or alias.
    #[inline]
    pub fn type_by_name(&self, name: &str) -> Option<TileType> {
        self.type_names.get(name).copied()
    }

    /// Looks up a plane by name or alias.
    #[inline]
    pub fn plane_by_name(&self, name: &str) -> Option<PlaneId> {
        self.plane_names.get(name).copied()
    }

    /// The full name of a type.
    pub fn type_name(&self, t: TileType) -> &str {
        self.types
            .get(t.index())
            .map(|info| info.name.as_str())
            .unwrap_or("<bad type>")
    }

    /// A name of at most eight characters for table listings.
    pub fn short_name(&self, t: TileType) -> &str {
        if t == TileType::SPACE {
            return "space";
        }
        let name = self.type_name(t);
        match name.char_indices().nth(8) {
            Some((idx, _)) => &name[..idx],
            None => name,
        }
    }

    /// The name of a plane.
    pub fn plane_name(&self, plane: PlaneId) -> &str {
        match self.planes.get(plane.index()) {
            Some(name) => name.as_str(),
            None => {
                tracing::error!(plane = plane.index(), "plane index out of range");
                "<bad plane>"
            }
        }
    }
}

/// A builder for a [`TechDb`].
///
/// Space and the error type are always present.
#[derive(Debug)]
pub struct TechDbBuilder {
    db: TechDb,
    warned_capacity: bool,
}

impl Default for TechDbBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TechDbBuilder {
    /// Creates a builder containing only the reserved types.
    pub fn new() -> Self {
        let mut db = TechDb {
            planes: Vec::new(),
            types: Vec::new(),
            type_names: IndexMap::new(),
            plane_names: IndexMap::new(),
            paint: HashMap::new(),
        };
        for (t, name) in [(TileType::SPACE, "space"), (TileType::ERROR, "error")] {
            db.types.push(TypeInfo {
                name: ArcStr::from(name),
                kind: TypeKind::Reserved,
                planes: PlaneMask::EMPTY,
            });
            db.type_names.insert(ArcStr::from(name), t);
        }
        Self {
            db,
            warned_capacity: false,
        }
    }

    fn check_names<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), TechDbError> {
        for name in names {
            if self.db.type_names.contains_key(name) || self.db.plane_names.contains_key(name) {
                return Err(TechDbError::DuplicateName { name: name.into() });
            }
        }
        Ok(())
    }

    fn capacity_exceeded(&mut self, err: TechDbError) -> TechDbError {
        if !self.warned_capacity {
            tracing::warn!("{}; further additions are refused", err);
            self.warned_capacity = true;
        }
        err
    }

    /// Declares a plane and its aliases.
    pub fn add_plane(&mut self, name: &str, aliases: &[&str]) -> Result<PlaneId, TechDbError> {
        if self.db.planes.len() >= MAX_PLANES {
            return Err(self.capacity_exceeded(TechDbError::TooManyPlanes { max: MAX_PLANES }));
        }
        self.check_names(std::iter::once(name).chain(aliases.iter().copied()))?;
        let id = PlaneId::new(self.db.planes.len());
        self.db.planes.push(name.into());
        for n in std::iter::once(name).chain(aliases.iter().copied()) {
            self.db.plane_names.insert(n.into(), id);
        }
        // Space lives on every plane.
        self.db.types[TileType::SPACE.index()].planes.insert(id);
        Ok(id)
    }

    fn push_type(
        &mut self,
        name: &str,
        aliases: &[&str],
        kind: TypeKind,
        planes: PlaneMask,
    ) -> Result<TileType, TechDbError> {
        if self.db.types.len() >= MAX_TYPES {
            return Err(self.capacity_exceeded(TechDbError::TooManyTypes { max: MAX_TYPES }));
        }
        self.check_names(std::iter::once(name).chain(aliases.iter().copied()))?;
        let t = TileType::new(self.db.types.len());
        self.db.types.push(TypeInfo {
            name: name.into(),
            kind,
            planes,
        });
        for n in std::iter::once(name).chain(aliases.iter().copied()) {
            self.db.type_names.insert(n.into(), t);
        }
        Ok(t)
    }

    /// Declares a layer living on `plane`.
    pub fn add_layer(
        &mut self,
        name: &str,
        plane: &str,
        aliases: &[&str],
    ) -> Result<TileType, TechDbError> {
        let plane = self
            .db
            .plane_by_name(plane)
            .ok_or_else(|| TechDbError::UnknownPlane { name: plane.into() })?;
        self.push_type(name, aliases, TypeKind::Layer, PlaneMask::bit(plane))
    }

    /// Declares a contact joining the given residue layers.
    pub fn add_contact(
        &mut self,
        name: &str,
        residues: &[&str],
        aliases: &[&str],
    ) -> Result<TileType, TechDbError> {
        if residues.is_empty() {
            return Err(TechDbError::NoResidues { name: name.into() });
        }
        let mut mask = TypeMask::EMPTY;
        let mut planes = PlaneMask::EMPTY;
        for residue in residues {
            let t = self
                .db
                .type_by_name(residue)
                .filter(|t| !t.is_reserved())
                .ok_or_else(|| TechDbError::UnknownType {
                    name: (*residue).into(),
                })?;
            if self.db.is_contact(t) {
                return Err(TechDbError::ContactResidue {
                    name: (*residue).into(),
                });
            }
            mask.insert(t);
            planes |= self.db.planes_of(t);
        }
        self.push_type(name, aliases, TypeKind::Contact { residues: mask }, planes)
    }

    /// Overrides the result of painting `paint` over `have` on `plane`.
    pub fn paint_override(
        &mut self,
        plane: &str,
        paint: &str,
        have: &str,
        result: &str,
    ) -> Result<(), TechDbError> {
        let plane = self
            .db
            .plane_by_name(plane)
            .ok_or_else(|| TechDbError::UnknownPlane { name: plane.into() })?;
        let lookup = |name: &str| {
            self.db
                .type_by_name(name)
                .ok_or_else(|| TechDbError::UnknownType { name: name.into() })
        };
        let key = (plane, lookup(paint)?, lookup(have)?);
        let result = lookup(result)?;
        self.db.paint.insert(key, result);
        Ok(())
    }

    /// Consumes the builder, returning the database.
    #[inline]
    pub fn build(self) -> TechDb {
        self.db
    }
}

/// A serializable description of a technology's planes and types.
///
/// ```toml
/// [[planes]]
/// name = "active"
///
/// [[layers]]
/// name = "poly"
/// plane = "active"
/// aliases = ["p"]
///
/// [[contacts]]
/// name = "pc"
/// residues = ["poly", "m1"]
///
/// [[paint]]
/// plane = "active"
/// paint = "poly"
/// have = "ndiff"
/// result = "nfet"
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TechDesc {
    pub planes: Vec<PlaneDesc>,
    pub layers: Vec<LayerDesc>,
    pub contacts: Vec<ContactDesc>,
    pub paint: Vec<PaintDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaneDesc {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerDesc {
    pub name: String,
    pub plane: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContactDesc {
    pub name: String,
    pub residues: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaintDesc {
    pub plane: String,
    pub paint: String,
    pub have: String,
    pub result: String,
}

fn strs(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}

impl TechDesc {
    /// Parses a description from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a description from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Builds the described database.
    ///
    /// Planes are declared first, then layers, then contacts, then paint overrides.
    pub fn build(&self) -> Result<TechDb, TechDbError> {
        let mut builder = TechDb::builder();
        for plane in &self.planes {
            builder.add_plane(&plane.name, &strs(&plane.aliases))?;
        }
        for layer in &self.layers {
            builder.add_layer(&layer.name, &layer.plane, &strs(&layer.aliases))?;
        }
        for contact in &self.contacts {
            builder.add_contact(
                &contact.name,
                &strs(&contact.residues),
                &strs(&contact.aliases),
            )?;
        }
        for p in &self.paint {
            builder.paint_override(&p.plane, &p.paint, &p.have, &p.result)?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn reserved_types() {
        let mut b = TechDb::builder();
        b.add_plane("active", &[]).unwrap();
        b.add_plane("metal1", &["m1p"]).unwrap();
        let db = b.build();
        assert_eq!(db.num_types(), 2);
        assert_eq!(db.planes_of(TileType::SPACE), db.all_planes());
        assert!(db.planes_of(TileType::ERROR).is_empty());
        assert_eq!(db.plane_by_name("m1p"), Some(PlaneId::new(1)));
        assert_eq!(db.home_plane(TileType::ERROR), PlaneId::new(2));
        assert_eq!(db.short_name(TileType::SPACE), "space");
    }

    #[test]
    fn contacts_span_residue_planes() {
        let mut b = TechDb::builder();
        let active = b.add_plane("active", &[]).unwrap();
        let metal1 = b.add_plane("metal1", &[]).unwrap();
        let poly = b.add_layer("polysilicon", "active", &["poly"]).unwrap();
        let m1 = b.add_layer("m1", "metal1", &[]).unwrap();
        let pc = b.add_contact("pc", &["poly", "m1"], &[]).unwrap();
        let db = b.build();

        assert_eq!(db.planes_of(pc), PlaneMask::bit(active) | PlaneMask::bit(metal1));
        assert_eq!(db.home_plane(pc), active);
        assert!(db.plane_types(metal1).contains(pc));
        assert!(db.plane_types(metal1).contains(TileType::SPACE));
        assert!(!db.plane_types(metal1).contains(poly));
        assert_eq!(db.contacts_with_residue(m1), TypeMask::single(pc));
        assert_eq!(db.residues(poly), TypeMask::single(poly));
        assert_eq!(db.type_by_name("poly"), Some(poly));
        assert_eq!(db.short_name(poly), "polysili");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut b = TechDb::builder();
        b.add_plane("active", &[]).unwrap();
        b.add_layer("poly", "active", &[]).unwrap();
        assert_eq!(
            b.add_layer("poly", "active", &[]),
            Err(TechDbError::DuplicateName { name: "poly".into() })
        );
        assert_eq!(
            b.add_layer("space", "active", &[]),
            Err(TechDbError::DuplicateName {
                name: "space".into()
            })
        );
        assert!(matches!(
            b.add_layer("m1", "metal1", &[]),
            Err(TechDbError::UnknownPlane { .. })
        ));
    }

    #[test]
    fn type_capacity_is_enforced() {
        let mut b = TechDb::builder();
        b.add_plane("active", &[]).unwrap();
        for i in 2..MAX_TYPES {
            b.add_layer(&format!("l{i}"), "active", &[]).unwrap();
        }
        for _ in 0..3 {
            assert_eq!(
                b.add_layer("overflow", "active", &[]),
                Err(TechDbError::TooManyTypes { max: MAX_TYPES })
            );
        }
        assert_eq!(b.build().num_types(), MAX_TYPES);
    }

    #[test]
    fn paint_results() {
        let mut b = TechDb::builder();
        let active = b.add_plane("active", &[]).unwrap();
        let metal1 = b.add_plane("metal1", &[]).unwrap();
        let poly = b.add_layer("poly", "active", &[]).unwrap();
        let ndiff = b.add_layer("ndiff", "active", &[]).unwrap();
        let nfet = b.add_layer("nfet", "active", &[]).unwrap();
        let m1 = b.add_layer("m1", "metal1", &[]).unwrap();
        b.paint_override("active", "poly", "ndiff", "nfet").unwrap();
        let db = b.build();

        assert_eq!(db.paint_result(active, poly, ndiff), nfet);
        assert_eq!(db.paint_result(active, ndiff, poly), ndiff);
        assert_eq!(db.paint_result(active, m1, poly), poly);
        assert_eq!(db.paint_result(metal1, m1, TileType::SPACE), m1);
        assert_eq!(db.paint_result(active, TileType::SPACE, poly), poly);
        assert!(!db.paint_on_type_planes(m1, poly));
    }

    #[test]
    fn tech_desc_from_toml() {
        let desc = TechDesc::from_toml_str(
            r#"
            [[planes]]
            name = "active"
            [[planes]]
            name = "metal1"

            [[layers]]
            name = "poly"
            plane = "active"
            aliases = ["p"]
            [[layers]]
            name = "m1"
            plane = "metal1"

            [[contacts]]
            name = "pc"
            residues = ["p", "m1"]
            "#,
        )
        .unwrap();
        let db = desc.build().unwrap();
        assert_eq!(db.num_types(), 5);
        assert_eq!(db.num_planes(), 2);
        assert!(db.is_contact(db.type_by_name("pc").unwrap()));
    }
}
