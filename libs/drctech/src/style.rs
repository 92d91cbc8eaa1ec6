//! DRC styles.

use arcstr::ArcStr;

use crate::config::DrcConfig;
use crate::paint::PaintTable;
use crate::table::RuleTable;
use crate::tech::TechDb;
use crate::types::TypeMask;
use crate::why::WhyTable;

/// The loading state of the current style.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum StyleStatus {
    /// The style's section has not been reached yet.
    #[default]
    NotLoaded,
    /// Rule lines are being compiled into the style.
    Pending,
    /// Rule lines belong to a variant other than this style.
    Suspended,
    /// The style's section has ended.
    Loaded,
}

/// A compiled set of DRC rules.
#[derive(Clone, Debug)]
pub struct RuleStyle {
    pub(crate) name: Option<ArcStr>,
    pub(crate) status: StyleStatus,
    pub(crate) rules: RuleTable,
    pub(crate) paint: PaintTable,
    pub(crate) exact_overlap: TypeMask,
    pub(crate) scale_n: i32,
    pub(crate) scale_d: i32,
    pub(crate) halo: i32,
    pub(crate) step_size: i32,
    pub(crate) whys: WhyTable,
    pub(crate) rules_specified: usize,
    pub(crate) rules_optimized: usize,
    pub(crate) finalized: bool,
}

impl RuleStyle {
    /// Creates an empty style for `tech`.
    pub fn new(name: Option<ArcStr>, tech: &TechDb) -> Self {
        Self {
            name,
            status: StyleStatus::NotLoaded,
            rules: RuleTable::new(tech.num_types()),
            paint: PaintTable::new(tech),
            exact_overlap: TypeMask::EMPTY,
            scale_n: 1,
            scale_d: 1,
            halo: 0,
            step_size: 0,
            whys: WhyTable::new(),
            rules_specified: 0,
            rules_optimized: 0,
            finalized: false,
        }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn status(&self) -> StyleStatus {
        self.status
    }

    #[inline]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    #[inline]
    pub fn paint(&self) -> &PaintTable {
        &self.paint
    }

    /// Types whose overlaps must match exactly across cell boundaries.
    #[inline]
    pub fn exact_overlap(&self) -> &TypeMask {
        &self.exact_overlap
    }

    /// The scale factor as `(numerator, denominator)`.
    #[inline]
    pub fn scale_factor(&self) -> (i32, i32) {
        (self.scale_n, self.scale_d)
    }

    /// The maximum interaction distance of any rule.
    ///
    /// Before finalization this is the largest distance returned by a
    /// compiled line, in technology units.
    #[inline]
    pub fn halo(&self) -> i32 {
        self.halo
    }

    /// The chunk size for incremental checking. Zero means automatic.
    #[inline]
    pub fn step_size(&self) -> i32 {
        self.step_size
    }

    #[inline]
    pub fn whys(&self) -> &WhyTable {
        &self.whys
    }

    #[inline]
    pub fn rules_specified(&self) -> usize {
        self.rules_specified
    }

    #[inline]
    pub fn rules_optimized(&self) -> usize {
        self.rules_optimized
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Records the distance returned by a compiled line.
    pub(crate) fn note_distance(&mut self, dist: i32) {
        self.halo = self.halo.max(dist);
    }

    /// Normalizes distances to the scale factor, derives the halo and step
    /// size, and optimizes the table.
    ///
    /// Calling this on a finalized style does nothing.
    pub fn finalize(&mut self, tech: &TechDb, config: &DrcConfig) {
        if self.finalized {
            return;
        }
        let _span = tracing::debug_span!("finalize_style", style = self.name().unwrap_or("")).entered();

        self.rules.scale_up(self.scale_d);
        self.rules.scale_down(self.scale_n);

        let n = self.scale_n.max(1) as i64;
        let scaled = (self.halo as i64 * self.scale_d as i64 + n - 1) / n;
        self.halo = scaled.min(i32::MAX as i64) as i32;

        if self.step_size == 0 {
            self.step_size = if self.halo == 0 {
                config.empty_step_size()
            } else {
                self.halo.saturating_mul(16)
            };
        }
        self.finalized = true;
        tracing::debug!(
            halo = self.halo,
            step_size = self.step_size,
            edge_rules = self.rules.num_edge_rules(),
            "finalized DRC style"
        );

        if config.rule_optimization {
            self.optimize(tech);
        }
    }
}
