//! The dense rules table.

use crate::rule::Rule;
use crate::types::TileType;

/// Ordered rule buckets indexed by `(from, to)` tile type pairs.
///
/// Every bucket is sorted by non-decreasing [`Rule::key`].
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    num_types: usize,
    buckets: Vec<Vec<Rule>>,
}

impl RuleTable {
    /// Creates an empty table for `num_types` tile types.
    pub fn new(num_types: usize) -> Self {
        Self {
            num_types,
            buckets: vec![Vec::new(); num_types * num_types],
        }
    }

    #[inline]
    pub fn num_types(&self) -> usize {
        self.num_types
    }

    #[inline]
    fn index(&self, from: TileType, to: TileType) -> Option<usize> {
        (from.index() < self.num_types && to.index() < self.num_types)
            .then(|| from.index() * self.num_types + to.index())
    }

    /// The rules checked on edges from `from` to `to`.
    pub fn bucket(&self, from: TileType, to: TileType) -> &[Rule] {
        match self.index(from, to) {
            Some(idx) => &self.buckets[idx],
            None => &[],
        }
    }

    pub(crate) fn bucket_mut(&mut self, from: TileType, to: TileType) -> Option<&mut Vec<Rule>> {
        let idx = self.index(from, to)?;
        Some(&mut self.buckets[idx])
    }

    /// The position at which a unit keyed by `dist` is inserted.
    ///
    /// The unit goes after every unit with a smaller key, so units with equal
    /// keys keep their insertion order reversed.
    pub fn insertion_index(&self, from: TileType, to: TileType, dist: i32) -> usize {
        let bucket = self.bucket(from, to);
        bucket
            .iter()
            .position(|rule| rule.key() >= dist)
            .unwrap_or(bucket.len())
    }

    /// Inserts `rule` into the `(from, to)` bucket, keeping it sorted.
    ///
    /// Insertions outside the table are dropped.
    pub fn insert(&mut self, from: TileType, to: TileType, rule: impl Into<Rule>) {
        let rule = rule.into();
        let pos = self.insertion_index(from, to, rule.key());
        match self.bucket_mut(from, to) {
            Some(bucket) => bucket.insert(pos, rule),
            None => tracing::error!(
                from = from.index(),
                to = to.index(),
                "rule inserted outside the table"
            ),
        }
    }

    /// Iterates over every non-empty bucket in `(from, to)` order.
    pub fn iter(&self) -> impl Iterator<Item = (TileType, TileType, &[Rule])> {
        let n = self.num_types;
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(move |(idx, bucket)| {
                (
                    TileType::new(idx / n),
                    TileType::new(idx % n),
                    bucket.as_slice(),
                )
            })
    }

    pub(crate) fn buckets_mut(&mut self) -> impl Iterator<Item = &mut Vec<Rule>> {
        self.buckets.iter_mut()
    }

    /// The total number of edge rules, counting both halves of a triggered rule.
    pub fn num_edge_rules(&self) -> usize {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter())
            .map(Rule::len)
            .sum()
    }

    /// Returns `true` if every bucket is sorted by key.
    pub fn is_sorted(&self) -> bool {
        self.buckets
            .iter()
            .all(|bucket| bucket.windows(2).all(|w| w[0].key() <= w[1].key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Direction, EdgeRule};
    use crate::types::TypeMask;
    use crate::why::WhyId;

    fn rule(dist: i32) -> EdgeRule {
        EdgeRule::new(
            Direction::Forward,
            dist,
            dist,
            TypeMask::EMPTY,
            TypeMask::EMPTY,
            WhyId::default(),
        )
    }

    #[test]
    fn insertions_stay_sorted() {
        let mut table = RuleTable::new(4);
        let (a, b) = (TileType::new(2), TileType::new(3));
        for dist in [5, 1, 3, 3, 0, 9] {
            table.insert(a, b, rule(dist));
        }
        table.insert(
            a,
            b,
            Rule::Triggered {
                trigger: rule(100),
                rule: rule(4),
            },
        );
        let keys: Vec<_> = table.bucket(a, b).iter().map(Rule::key).collect();
        assert_eq!(keys, vec![0, 1, 3, 3, 4, 5, 9]);
        assert!(table.is_sorted());
        assert_eq!(table.num_edge_rules(), 8);
        assert!(table.bucket(b, a).is_empty());
        assert_eq!(table.iter().count(), 1);
    }

    #[test]
    fn equal_keys_insert_before_existing() {
        let mut table = RuleTable::new(3);
        let t = TileType::new(2);
        table.insert(TileType::SPACE, t, rule(2).with_outside());
        table.insert(TileType::SPACE, t, rule(2));
        assert!(!table.bucket(TileType::SPACE, t)[0].checked().outside());
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut table = RuleTable::new(3);
        table.insert(TileType::new(5), TileType::new(2), rule(1));
        assert_eq!(table.num_edge_rules(), 0);
        assert!(table.bucket(TileType::new(5), TileType::new(2)).is_empty());
    }
}
