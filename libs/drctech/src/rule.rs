//! Edge rules and the atomic units stored in a rules table.

use serde::{Deserialize, Serialize};

use crate::types::{PlaneId, TypeMask};
use crate::why::WhyId;

/// The largest distance a rule line may name, in technology units.
pub const MAX_DISTANCE: i32 = 1 << 24;

/// The direction in which an edge rule is applied.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    /// Left to right, or bottom to top.
    #[default]
    Forward,
    /// Right to left, or top to bottom.
    Reverse,
}

/// Size parity required by a rectangle rule.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Parity {
    #[default]
    Any,
    Even,
    Odd,
}

/// The angles permitted by an angles rule.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum AngleLimit {
    /// Multiples of 45 degrees.
    Octilinear,
    /// Multiples of 90 degrees.
    Manhattan,
}

/// What an edge rule checks.
///
/// Every kind other than [`RuleKind::Edge`] is nonstandard: it is not
/// processed by the four-way edge search.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum RuleKind {
    /// A plain edge check.
    #[default]
    Edge,
    /// A minimum area check. The corner distance holds the area.
    Area,
    /// A maximum width check.
    MaxWidth { bends: bool },
    /// A rectangle size check.
    RectSize { parity: Parity },
    /// An angle check.
    Angles { limit: AngleLimit },
}

impl RuleKind {
    /// Returns `true` for every kind other than [`RuleKind::Edge`].
    #[inline]
    pub fn is_nonstandard(&self) -> bool {
        !matches!(self, Self::Edge)
    }
}

/// A single edge check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EdgeRule {
    pub(crate) dist: i32,
    pub(crate) cdist: i32,
    pub(crate) dist_rem: i32,
    pub(crate) cdist_rem: i32,
    pub(crate) ok_types: TypeMask,
    pub(crate) corner_types: TypeMask,
    pub(crate) direction: Direction,
    pub(crate) both_corners: bool,
    pub(crate) outside: bool,
    pub(crate) kind: RuleKind,
    pub(crate) check_plane: PlaneId,
    pub(crate) edge_plane: PlaneId,
    pub(crate) why: WhyId,
}

impl EdgeRule {
    /// Creates a plain edge rule checked on plane 0.
    ///
    /// Use [`EdgeRule::on`] to place it.
    pub fn new(
        direction: Direction,
        dist: i32,
        cdist: i32,
        ok_types: TypeMask,
        corner_types: TypeMask,
        why: WhyId,
    ) -> Self {
        Self {
            dist,
            cdist,
            dist_rem: 0,
            cdist_rem: 0,
            ok_types,
            corner_types,
            direction,
            both_corners: false,
            outside: false,
            kind: RuleKind::Edge,
            check_plane: PlaneId::default(),
            edge_plane: PlaneId::default(),
            why,
        }
    }

    /// Sets the plane searched for OK types and the plane holding the edge.
    #[inline]
    pub fn on(mut self, check_plane: PlaneId, edge_plane: PlaneId) -> Self {
        self.check_plane = check_plane;
        self.edge_plane = edge_plane;
        self
    }

    #[inline]
    pub fn with_both_corners(mut self) -> Self {
        self.both_corners = true;
        self
    }

    #[inline]
    pub fn with_outside(mut self) -> Self {
        self.outside = true;
        self
    }

    #[inline]
    pub fn with_kind(mut self, kind: RuleKind) -> Self {
        self.kind = kind;
        self
    }

    /// The extent of the rule from the edge.
    #[inline]
    pub fn dist(&self) -> i32 {
        self.dist
    }

    /// The corner extension distance, or the area for area rules.
    #[inline]
    pub fn corner_dist(&self) -> i32 {
        self.cdist
    }

    /// The remainder discarded when `dist` was last scaled down.
    #[inline]
    pub fn dist_remainder(&self) -> i32 {
        self.dist_rem
    }

    /// The remainder discarded when `corner_dist` was last scaled down.
    #[inline]
    pub fn corner_remainder(&self) -> i32 {
        self.cdist_rem
    }

    #[inline]
    pub fn ok_types(&self) -> &TypeMask {
        &self.ok_types
    }

    #[inline]
    pub fn corner_types(&self) -> &TypeMask {
        &self.corner_types
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.direction == Direction::Reverse
    }

    /// Whether corner extensions are made in both directions.
    #[inline]
    pub fn both_corners(&self) -> bool {
        self.both_corners
    }

    /// Whether the rule applies only to the outside edge of the rule area.
    #[inline]
    pub fn outside(&self) -> bool {
        self.outside
    }

    #[inline]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    #[inline]
    pub fn is_nonstandard(&self) -> bool {
        self.kind.is_nonstandard()
    }

    #[inline]
    pub fn is_max_width(&self) -> bool {
        matches!(self.kind, RuleKind::MaxWidth { .. })
    }

    #[inline]
    pub fn is_area(&self) -> bool {
        matches!(self.kind, RuleKind::Area)
    }

    #[inline]
    pub fn check_plane(&self) -> PlaneId {
        self.check_plane
    }

    #[inline]
    pub fn edge_plane(&self) -> PlaneId {
        self.edge_plane
    }

    #[inline]
    pub fn why(&self) -> WhyId {
        self.why
    }
}

/// An atomic entry in a rules table bucket.
///
/// A triggered rule is only checked where its trigger is violated. The two
/// halves are always inserted, moved and removed together.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rule {
    Simple(EdgeRule),
    Triggered { trigger: EdgeRule, rule: EdgeRule },
}

impl Rule {
    /// The rule whose distance orders the bucket and which the optimizer compares.
    #[inline]
    pub fn checked(&self) -> &EdgeRule {
        match self {
            Self::Simple(rule) => rule,
            Self::Triggered { rule, .. } => rule,
        }
    }

    #[inline]
    pub fn trigger(&self) -> Option<&EdgeRule> {
        match self {
            Self::Simple(_) => None,
            Self::Triggered { trigger, .. } => Some(trigger),
        }
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered { .. })
    }

    /// The sort key of this unit within its bucket.
    #[inline]
    pub fn key(&self) -> i32 {
        self.checked().dist
    }

    /// Iterates over the edge rules of this unit, trigger first.
    pub fn edge_rules(&self) -> impl Iterator<Item = &EdgeRule> {
        let (first, second) = match self {
            Self::Simple(rule) => (rule, None),
            Self::Triggered { trigger, rule } => (trigger, Some(rule)),
        };
        std::iter::once(first).chain(second)
    }

    pub(crate) fn edge_rules_mut(&mut self) -> impl Iterator<Item = &mut EdgeRule> {
        let (first, second) = match self {
            Self::Simple(rule) => (rule, None),
            Self::Triggered { trigger, rule } => (trigger, Some(rule)),
        };
        std::iter::once(first).chain(second)
    }

    /// The number of edge rules in this unit.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Simple(_) => 1,
            Self::Triggered { .. } => 2,
        }
    }
}

impl From<EdgeRule> for Rule {
    fn from(value: EdgeRule) -> Self {
        Self::Simple(value)
    }
}
