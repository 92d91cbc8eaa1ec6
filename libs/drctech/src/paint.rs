//! Per-style paint result overrides.

use crate::tech::TechDb;
use crate::types::{PlaneId, TileType};

/// The result of painting one type over another on each plane.
///
/// Illegal overlaps produce [`TileType::ERROR`].
#[derive(Clone, Debug, Default)]
pub struct PaintTable {
    num_types: usize,
    results: Vec<TileType>,
}

impl PaintTable {
    /// Derives the table from the database paint results.
    pub fn new(tech: &TechDb) -> Self {
        let n = tech.num_types();
        let mut results = Vec::with_capacity(tech.num_planes() * n * n);
        for p in (0..tech.num_planes()).map(PlaneId::new) {
            for i in tech.types() {
                for j in tech.types() {
                    results.push(initial_result(tech, p, i, j));
                }
            }
        }
        Self {
            num_types: n,
            results,
        }
    }

    #[inline]
    fn index(&self, plane: PlaneId, paint: TileType, have: TileType) -> Option<usize> {
        let n = self.num_types;
        if paint.index() >= n || have.index() >= n {
            return None;
        }
        let idx = (plane.index() * n + paint.index()) * n + have.index();
        (idx < self.results.len()).then_some(idx)
    }

    /// The result of painting `paint` over `have` on `plane`.
    pub fn get(&self, plane: PlaneId, paint: TileType, have: TileType) -> TileType {
        self.index(plane, paint, have)
            .map(|idx| self.results[idx])
            .unwrap_or(have)
    }

    pub(crate) fn set(&mut self, plane: PlaneId, paint: TileType, have: TileType, result: TileType) {
        if let Some(idx) = self.index(plane, paint, have) {
            self.results[idx] = result;
        }
    }

    /// Iterates over the pairs `(paint, have)` whose overlap is illegal on `plane`.
    pub fn illegal_overlaps(&self, plane: PlaneId) -> impl Iterator<Item = (TileType, TileType)> + '_ {
        let n = self.num_types;
        (0..n).flat_map(move |i| {
            (0..n)
                .map(move |j| (TileType::new(i), TileType::new(j)))
                .filter(move |(i, j)| {
                    *i != TileType::ERROR
                        && *j != TileType::ERROR
                        && self.get(plane, *i, *j) == TileType::ERROR
                })
        })
    }
}

fn initial_result(tech: &TechDb, p: PlaneId, i: TileType, j: TileType) -> TileType {
    if i == TileType::ERROR || j == TileType::ERROR {
        return TileType::ERROR;
    }
    let result = tech.paint_result(p, i, j);
    if i == TileType::SPACE
        || j == TileType::SPACE
        || !tech.type_on_plane(j, p)
        || tech.types_on_same_plane(i, j).is_empty()
    {
        return result;
    }
    if tech.is_contact(i) || tech.is_contact(result) {
        return result;
    }
    let unrelated = !tech.layer_mask(i).contains(result) && !tech.layer_mask(j).contains(result);
    let asymmetric = result != tech.paint_result(p, j, i)
        && tech.type_on_plane(i, p)
        && tech.paint_on_type_planes(j, i);
    if unrelated || asymmetric {
        TileType::ERROR
    } else {
        result
    }
}
