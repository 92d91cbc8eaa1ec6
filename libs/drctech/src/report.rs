//! Listings, statistics and queries over a compiled style.

use std::fmt::Display;
use std::io::Write;

use crate::registry::DrcTech;
use crate::rule::{EdgeRule, RuleKind};
use crate::style::RuleStyle;
use crate::tech::TechDb;
use crate::types::{PlaneId, TileType, TypeMask};

/// The largest rules-per-edge count with its own histogram bin.
pub const MAX_BIN: usize = 10;

/// Summary counts for a rules table.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuleStats {
    /// Rule lines compiled into the style.
    pub specified: usize,
    /// Edge rules removed by the optimizer.
    pub optimized: usize,
    /// Edge rules left in the table.
    pub remaining: usize,
    /// The number of edges with each count of edge rules, for edges whose
    /// types share a plane.
    pub histogram: [usize; MAX_BIN + 1],
    /// The number of edges with more than [`MAX_BIN`] edge rules.
    pub overflow: usize,
}

impl Display for RuleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Total number of rules specified in tech file: {}",
            self.specified
        )?;
        writeln!(f, "Edge rules optimized away: {}", self.optimized)?;
        writeln!(f, "Edge rules left in database: {}", self.remaining)?;
        writeln!(f, "Histogram of # edges vs. rules per edge:")?;
        for (i, count) in self.histogram.iter().enumerate() {
            writeln!(f, "  {:2} rules/edge: {}.", i, count)?;
        }
        writeln!(f, " >{:2} rules/edge: {}.", MAX_BIN, self.overflow)
    }
}

fn mask_to_print(tech: &TechDb, mask: &TypeMask) -> String {
    if mask.is_empty() {
        return "<none>".to_string();
    }
    mask.iter(tech.num_types())
        .map(|t| tech.short_name(t))
        .collect::<Vec<_>>()
        .join(",")
}

fn flag_words(rule: &EdgeRule, trigger: bool) -> Vec<&'static str> {
    let mut words = Vec::new();
    if rule.is_reverse() {
        words.push("reverse");
    }
    if rule.both_corners() {
        words.push("both-corners");
    }
    if trigger {
        words.push("trigger");
    }
    match rule.kind() {
        RuleKind::Edge => {}
        RuleKind::Area => words.push("area"),
        RuleKind::MaxWidth { bends } => {
            words.push("maxwidth");
            if bends {
                words.push("bends");
            }
        }
        RuleKind::RectSize { .. } => words.push("rect-size"),
        RuleKind::Angles { .. } => words.push("angles"),
    }
    words
}

impl RuleStyle {
    /// Writes every non-empty bucket, the illegal overlaps and the
    /// exact-overlap types.
    pub fn write_rules_table(&self, tech: &TechDb, w: &mut impl Write) -> std::io::Result<()> {
        for i in tech.types() {
            let mut any = false;
            for j in tech.types() {
                let mut first = true;
                for unit in self.rules.bucket(i, j) {
                    for (idx, rule) in unit.edge_rules().enumerate() {
                        let trigger = unit.is_triggered() && idx == 0;
                        if first {
                            write!(w, "{:<8} {:<8}  ", tech.short_name(i), tech.short_name(j))?;
                            first = false;
                        } else {
                            write!(w, "{:19}", "")?;
                        }
                        writeln!(
                            w,
                            "{} x {}   {} ({})",
                            rule.dist(),
                            rule.corner_dist(),
                            mask_to_print(tech, rule.ok_types()),
                            tech.plane_name(rule.check_plane())
                        )?;
                        write!(w, "{:27}{}", "", mask_to_print(tech, rule.corner_types()))?;
                        let words = flag_words(rule, trigger);
                        if !words.is_empty() || rule.outside() {
                            write!(w, "\n{:26}", "")?;
                        }
                        for word in words {
                            write!(w, " {word}")?;
                        }
                        writeln!(w)?;
                    }
                }
                any |= !first;
            }
            if any {
                writeln!(w)?;
            }
        }

        if tech.num_planes() > 0 {
            for (i, j) in self.paint.illegal_overlaps(PlaneId::new(0)) {
                writeln!(
                    w,
                    "Tile type {} can't overlap type {}.",
                    tech.short_name(i),
                    tech.short_name(j)
                )?;
            }
        }

        if !self.exact_overlap.is_empty() {
            writeln!(
                w,
                "Types that must overlap exactly: {}",
                mask_to_print(tech, &self.exact_overlap)
            )?;
        }
        Ok(())
    }

    /// Counts the edge rules in the table.
    pub fn rule_stats(&self, tech: &TechDb) -> RuleStats {
        let mut stats = RuleStats {
            specified: self.rules_specified,
            optimized: self.rules_optimized,
            ..Default::default()
        };
        for i in tech.types() {
            for j in tech.types() {
                let count: usize = self.rules.bucket(i, j).iter().map(|unit| unit.len()).sum();
                stats.remaining += count;
                if tech.types_on_same_plane(i, j).is_empty() {
                    continue;
                }
                match stats.histogram.get_mut(count) {
                    Some(bin) => *bin += 1,
                    None => stats.overflow += 1,
                }
            }
        }
        stats
    }

    /// The minimum width of `t` implied by its width rules, or 0.
    ///
    /// Buckets are ordered by distance, so the widest matching rule wins.
    pub fn default_layer_width(&self, tech: &TechDb, t: TileType) -> i32 {
        self.rules
            .bucket(TileType::SPACE, t)
            .iter()
            .flat_map(|unit| unit.edge_rules())
            .filter(|rule| {
                !rule.is_reverse()
                    && !rule.is_max_width()
                    && rule.ok_types().contains(t)
                    && rule.ok_types() == rule.corner_types()
                    && rule.check_plane() == tech.home_plane(t)
                    && rule.dist() == rule.corner_dist()
            })
            .last()
            .map(|rule| rule.dist())
            .unwrap_or(0)
    }

    /// The minimum spacing from `t1` to `t2` implied by spacing rules, or 0.
    ///
    /// Wide spacing rules are ignored.
    pub fn default_layer_spacing(&self, tech: &TechDb, t1: TileType, t2: TileType) -> i32 {
        self.rules
            .bucket(t1, TileType::SPACE)
            .iter()
            .filter(|unit| !unit.is_triggered())
            .map(|unit| unit.checked())
            .filter(|rule| {
                !rule.is_reverse()
                    && !rule.ok_types().contains(t2)
                    && tech.type_on_plane(t2, rule.check_plane())
                    && rule.dist() == rule.corner_dist()
            })
            .last()
            .map(|rule| rule.dist())
            .unwrap_or(0)
    }

    /// The minimum surround of `t1` by `t2` implied by surround rules, or 0.
    pub fn default_layer_surround(&self, tech: &TechDb, t1: TileType, t2: TileType) -> i32 {
        self.rules
            .bucket(t1, TileType::SPACE)
            .iter()
            .flat_map(|unit| unit.edge_rules())
            .filter(|rule| {
                !rule.is_reverse()
                    && !rule.ok_types().contains(TileType::SPACE)
                    && tech.type_on_plane(t2, rule.check_plane())
                    && rule.dist() == rule.corner_dist()
            })
            .last()
            .map(|rule| rule.dist())
            .unwrap_or(0)
    }
}

impl DrcTech {
    /// Writes the current style's rules table. Writes nothing without a style.
    pub fn write_rules_table(&self, w: &mut impl Write) -> std::io::Result<()> {
        match self.style() {
            Some(style) => style.write_rules_table(self.tech(), w),
            None => Ok(()),
        }
    }

    /// Statistics for the current style.
    pub fn rule_stats(&self) -> Option<RuleStats> {
        self.style().map(|style| style.rule_stats(self.tech()))
    }

    pub fn default_layer_width(&self, t: TileType) -> i32 {
        self.style()
            .map(|style| style.default_layer_width(self.tech(), t))
            .unwrap_or(0)
    }

    pub fn default_layer_spacing(&self, t1: TileType, t2: TileType) -> i32 {
        self.style()
            .map(|style| style.default_layer_spacing(self.tech(), t1, t2))
            .unwrap_or(0)
    }

    pub fn default_layer_surround(&self, t1: TileType, t2: TileType) -> i32 {
        self.style()
            .map(|style| style.default_layer_surround(self.tech(), t1, t2))
            .unwrap_or(0)
    }
}
