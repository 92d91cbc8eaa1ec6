//! Tile types, tile-type sets, and plane masks.
//!
//! These are pure value types. None of the operations here can fail;
//! an out-of-range plane index simply never matches.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// The maximum number of tile types a technology may declare.
pub const MAX_TYPES: usize = 256;

/// The maximum number of planes a technology may declare.
pub const MAX_PLANES: usize = 64;

const WORDS: usize = MAX_TYPES / 64;

/// A material or layer identifier.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TileType(u16);

impl TileType {
    /// The absence of material. Space lives on every plane.
    pub const SPACE: TileType = TileType(0);
    /// The sticky error type produced by illegal overlaps.
    pub const ERROR: TileType = TileType(1);
    /// The first type available to technology layers and contacts.
    pub const FIRST_USER: TileType = TileType(2);

    /// Creates a tile type from its index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not less than [`MAX_TYPES`].
    #[inline]
    pub const fn new(index: usize) -> Self {
        assert!(index < MAX_TYPES);
        Self(index as u16)
    }

    /// The index of this type.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if this is space or the error type.
    #[inline]
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_USER.0
    }
}

impl From<TileType> for usize {
    fn from(value: TileType) -> Self {
        value.index()
    }
}

/// A plane index.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PlaneId(u8);

impl PlaneId {
    /// Creates a plane identifier from its index.
    ///
    /// # Panics
    ///
    /// Panics if `index` exceeds [`MAX_PLANES`].
    /// `MAX_PLANES` itself is accepted as the "no plane" sentinel.
    #[inline]
    pub const fn new(index: usize) -> Self {
        assert!(index <= MAX_PLANES);
        Self(index as u8)
    }

    /// The index of this plane.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plane {}", self.0)
    }
}

/// A fixed-width set of tile types.
#[derive(Copy, Clone, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TypeMask([u64; WORDS]);

impl TypeMask {
    /// The empty set.
    pub const EMPTY: TypeMask = TypeMask([0; WORDS]);
    /// The set of every representable type.
    pub const ALL: TypeMask = TypeMask([u64::MAX; WORDS]);

    /// A set containing only `t`.
    #[inline]
    pub fn single(t: TileType) -> Self {
        let mut mask = Self::EMPTY;
        mask.insert(t);
        mask
    }

    /// Adds `t` to the set.
    #[inline]
    pub fn insert(&mut self, t: TileType) {
        self.0[t.index() / 64] |= 1 << (t.index() % 64);
    }

    /// Removes `t` from the set.
    #[inline]
    pub fn remove(&mut self, t: TileType) {
        self.0[t.index() / 64] &= !(1 << (t.index() % 64));
    }

    /// Returns `true` if `t` is a member of the set.
    #[inline]
    pub fn contains(&self, t: TileType) -> bool {
        self.0[t.index() / 64] & (1 << (t.index() % 64)) != 0
    }

    /// Returns `true` if the set has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Returns `true` if the two sets share at least one member.
    #[inline]
    pub fn intersects(&self, other: &TypeMask) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a & b != 0)
    }

    /// Returns `true` if every member of `self` is also a member of `other`.
    #[inline]
    pub fn is_subset(&self, other: &TypeMask) -> bool {
        (*self & *other) == *self
    }

    /// Iterates over the members of the set whose index is below `limit`.
    pub fn iter(&self, limit: usize) -> impl Iterator<Item = TileType> + '_ {
        (0..limit.min(MAX_TYPES))
            .map(TileType::new)
            .filter(move |t| self.contains(*t))
    }
}

impl fmt::Debug for TypeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter(MAX_TYPES).map(|t| t.index()))
            .finish()
    }
}

impl BitOr for TypeMask {
    type Output = TypeMask;
    fn bitor(mut self, rhs: TypeMask) -> TypeMask {
        self |= rhs;
        self
    }
}

impl BitOrAssign for TypeMask {
    fn bitor_assign(&mut self, rhs: TypeMask) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a |= b;
        }
    }
}

impl BitAnd for TypeMask {
    type Output = TypeMask;
    fn bitand(mut self, rhs: TypeMask) -> TypeMask {
        self &= rhs;
        self
    }
}

impl BitAndAssign for TypeMask {
    fn bitand_assign(&mut self, rhs: TypeMask) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a &= b;
        }
    }
}

impl Not for TypeMask {
    type Output = TypeMask;
    fn not(mut self) -> TypeMask {
        for w in self.0.iter_mut() {
            *w = !*w;
        }
        self
    }
}

impl FromIterator<TileType> for TypeMask {
    fn from_iter<I: IntoIterator<Item = TileType>>(iter: I) -> Self {
        let mut mask = TypeMask::EMPTY;
        for t in iter {
            mask.insert(t);
        }
        mask
    }
}

/// A set of planes.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlaneMask(u64);

impl PlaneMask {
    /// The empty plane set.
    pub const EMPTY: PlaneMask = PlaneMask(0);

    /// A plane set containing only `plane`.
    #[inline]
    pub fn bit(plane: PlaneId) -> Self {
        if plane.index() >= MAX_PLANES {
            return Self::EMPTY;
        }
        Self(1 << plane.index())
    }

    /// The set of the first `n` planes.
    #[inline]
    pub fn first(n: usize) -> Self {
        if n >= MAX_PLANES {
            Self(u64::MAX)
        } else {
            Self((1u64 << n) - 1)
        }
    }

    /// Returns `true` if `plane` is a member of the set.
    #[inline]
    pub fn contains(&self, plane: PlaneId) -> bool {
        plane.index() < MAX_PLANES && self.0 & (1 << plane.index()) != 0
    }

    /// Adds `plane` to the set.
    #[inline]
    pub fn insert(&mut self, plane: PlaneId) {
        *self |= Self::bit(plane);
    }

    /// Returns `true` if the set has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The least-numbered plane in the set, if any.
    #[inline]
    pub fn lowest(&self) -> Option<PlaneId> {
        if self.0 == 0 {
            None
        } else {
            Some(PlaneId::new(self.0.trailing_zeros() as usize))
        }
    }

    /// Iterates over the planes in the set, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = PlaneId> + '_ {
        (0..MAX_PLANES)
            .map(PlaneId::new)
            .filter(move |p| self.contains(*p))
    }
}

impl BitOr for PlaneMask {
    type Output = PlaneMask;
    fn bitor(self, rhs: PlaneMask) -> PlaneMask {
        PlaneMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for PlaneMask {
    fn bitor_assign(&mut self, rhs: PlaneMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PlaneMask {
    type Output = PlaneMask;
    fn bitand(self, rhs: PlaneMask) -> PlaneMask {
        PlaneMask(self.0 & rhs.0)
    }
}

impl BitAndAssign for PlaneMask {
    fn bitand_assign(&mut self, rhs: PlaneMask) {
        self.0 &= rhs.0;
    }
}

/// The planes shared by every user type in `types`, starting from `planes`.
///
/// Space and the error type do not constrain the result. An empty result
/// means the types have no plane in common.
pub fn coincident_planes(
    types: &TypeMask,
    planes: PlaneMask,
    num_types: usize,
    planes_of: impl Fn(TileType) -> PlaneMask,
) -> PlaneMask {
    types
        .iter(num_types)
        .filter(|t| !t.is_reserved())
        .fold(planes, |acc, t| acc & planes_of(t))
}

/// The least-numbered plane in `mask`, or `PlaneId::new(num_planes)` if the
/// mask contains none of the first `num_planes` planes.
pub fn lowest_plane(mask: PlaneMask, num_planes: usize) -> PlaneId {
    let num_planes = num_planes.min(MAX_PLANES);
    (0..num_planes)
        .map(PlaneId::new)
        .find(|p| mask.contains(*p))
        .unwrap_or(PlaneId::new(num_planes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(i: usize) -> TileType {
        TileType::new(i)
    }

    #[test]
    fn mask_algebra() {
        let a: TypeMask = [t(2), t(3)].into_iter().collect();
        let b: TypeMask = [t(3), t(200)].into_iter().collect();
        assert_eq!(a & b, TypeMask::single(t(3)));
        assert!((a | b).contains(t(200)));
        assert!(!(!a).contains(t(2)));
        assert!((!a).contains(t(199)));
        assert!(a.intersects(&b));
        assert!(TypeMask::single(t(3)).is_subset(&a));
        assert!(!a.is_subset(&b));
        assert_eq!(!!a, a);
        assert!(TypeMask::EMPTY.is_empty());
        assert_eq!(a.iter(4).collect::<Vec<_>>(), vec![t(2), t(3)]);
    }

    #[test]
    fn coincident_planes_intersects_member_planes() {
        let planes = |ty: TileType| match ty.index() {
            2 => PlaneMask::bit(PlaneId::new(0)),
            3 => PlaneMask::bit(PlaneId::new(0)) | PlaneMask::bit(PlaneId::new(1)),
            4 => PlaneMask::bit(PlaneId::new(1)),
            _ => PlaneMask::first(2),
        };
        let all = PlaneMask::first(2);
        let set: TypeMask = [t(2), t(3)].into_iter().collect();
        assert_eq!(
            coincident_planes(&set, all, 5, planes),
            PlaneMask::bit(PlaneId::new(0))
        );
        let set: TypeMask = [t(2), t(4)].into_iter().collect();
        assert!(coincident_planes(&set, all, 5, planes).is_empty());
        let set = TypeMask::single(TileType::SPACE);
        assert_eq!(coincident_planes(&set, all, 5, planes), all);
    }

    #[test]
    fn lowest_plane_terminates_on_empty_mask() {
        assert_eq!(lowest_plane(PlaneMask::EMPTY, 5), PlaneId::new(5));
        let mask = PlaneMask::bit(PlaneId::new(3)) | PlaneMask::bit(PlaneId::new(4));
        assert_eq!(lowest_plane(mask, 5), PlaneId::new(3));
        assert_eq!(mask.lowest(), Some(PlaneId::new(3)));
        // Planes beyond the declared count are not found.
        assert_eq!(lowest_plane(mask, 3), PlaneId::new(3));
    }
}
