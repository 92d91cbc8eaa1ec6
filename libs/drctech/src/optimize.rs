//! Pruning of redundant rules after a style is compiled.
//!
//! Two passes run over every bucket. The first collapses the rules of edges
//! that can never be legal down to one rule per edge plane that is always
//! violated. The second drops rules covered by a later rule in the same
//! bucket. Neither pass breaks the distance ordering of a bucket.

use crate::rule::{EdgeRule, Rule};
use crate::style::RuleStyle;
use crate::table::RuleTable;
use crate::tech::TechDb;
use crate::types::{PlaneMask, TileType};

impl RuleStyle {
    /// Runs both optimizer passes, counting the edge rules removed.
    pub(crate) fn optimize(&mut self, tech: &TechDb) {
        let _span = tracing::debug_span!("optimize_rules").entered();
        let collapsed = collapse_illegal_edges(&mut self.rules, tech);
        let subsumed = remove_subsumed(&mut self.rules, tech);
        self.rules_optimized += collapsed + subsumed;
        tracing::debug!(
            collapsed,
            subsumed,
            remaining = self.rules.num_edge_rules(),
            "optimized DRC rules"
        );
    }
}

/// Returns `true` if `rule` on the edge from `i` to `j` fails wherever the edge occurs.
fn witnesses_illegal_edge(rule: &EdgeRule, i: TileType, j: TileType, tech: &TechDb) -> bool {
    if rule.outside() || rule.is_nonstandard() {
        return false;
    }
    let end = if rule.is_reverse() { i } else { j };
    if end == TileType::SPACE || rule.ok_types().contains(end) {
        return false;
    }
    // OK types on another plane only count if the far type is there too.
    rule.check_plane() == rule.edge_plane() || tech.type_on_plane(end, rule.check_plane())
}

/// Collapses every bucket of an illegal edge, returning the number of edge rules removed.
pub(crate) fn collapse_illegal_edges(table: &mut RuleTable, tech: &TechDb) -> usize {
    let mut removed = 0;
    for i in tech.types() {
        for j in tech.types() {
            if let Some(bucket) = table.bucket_mut(i, j) {
                removed += collapse_bucket(bucket, i, j, tech);
            }
        }
    }
    removed
}

fn collapse_bucket(bucket: &mut Vec<Rule>, i: TileType, j: TileType, tech: &TechDb) -> usize {
    // The first witness on each edge plane governs that plane.
    let mut planes = PlaneMask::EMPTY;
    let mut witnesses: Vec<(usize, EdgeRule)> = Vec::new();
    for (idx, unit) in bucket.iter().enumerate() {
        let witness = unit
            .edge_rules()
            .filter(|rule| !planes.contains(rule.edge_plane()))
            .find(|rule| witnesses_illegal_edge(rule, i, j, tech));
        if let Some(witness) = witness {
            planes.insert(witness.edge_plane());
            witnesses.push((idx, witness.clone()));
        }
    }
    if witnesses.is_empty() {
        return 0;
    }

    let mut removed = 0;
    let old = std::mem::take(bucket);
    for (idx, unit) in old.into_iter().enumerate() {
        if let Some((_, witness)) = witnesses.iter().find(|(w, _)| *w == idx) {
            removed += unit.len() - 1;
            bucket.push(Rule::Simple(witness.clone()));
        } else if unit.edge_rules().any(|rule| planes.contains(rule.edge_plane())) {
            removed += unit.len();
        } else {
            bucket.push(unit);
        }
    }
    // A demoted trigger may carry a different key than its unit did.
    bucket.sort_by_key(Rule::key);
    removed
}

/// Returns `true` if `b` catches every violation `a` catches.
fn covers(b: &EdgeRule, a: &EdgeRule) -> bool {
    b.ok_types().is_subset(a.ok_types())
        && b.corner_types() == a.corner_types()
        && a.dist() <= b.dist()
        && a.corner_dist() <= b.corner_dist()
        && a.check_plane() == b.check_plane()
        && a.direction() == b.direction()
        && (!a.both_corners() || b.both_corners())
        && !b.is_nonstandard()
        && (a.dist() != b.dist() || a.outside() == b.outside())
}

/// Removes every unit covered by a later unit, returning the number of units removed.
///
/// Triggered units are never used as the covering rule.
pub(crate) fn remove_subsumed(table: &mut RuleTable, tech: &TechDb) -> usize {
    let mut removed = 0;
    for i in tech.types() {
        for j in tech.types() {
            let Some(bucket) = table.bucket_mut(i, j) else {
                continue;
            };
            let mut idx = 0;
            while idx < bucket.len() {
                let a = bucket[idx].checked();
                let covered = !a.is_nonstandard()
                    && bucket[idx + 1..]
                        .iter()
                        .filter(|b| !b.is_triggered())
                        .any(|b| covers(b.checked(), a));
                if covered {
                    bucket.remove(idx);
                    removed += 1;
                } else {
                    idx += 1;
                }
            }
        }
    }
    removed
}
