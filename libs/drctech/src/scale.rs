//! Conversion of rule distances between technology units and internal units.
//!
//! Distances are divided by the scale numerator and multiplied by the
//! denominator. Scaling down rounds up, except for maximum widths which
//! round down, and remembers the remainder so that scaling up by the same
//! factor restores the unscaled value.

use crate::rule::EdgeRule;
use crate::style::RuleStyle;
use crate::table::RuleTable;

impl EdgeRule {
    fn scale_down(&mut self, factor: i32) {
        if self.dist > 0 {
            self.dist_rem = self.dist % factor;
            self.dist /= factor;
            if self.dist_rem != 0 && !self.is_max_width() {
                self.dist += 1;
            }
        }
        if self.cdist > 0 {
            let factor = if self.is_area() {
                factor.saturating_mul(factor)
            } else {
                factor
            };
            self.cdist_rem = self.cdist % factor;
            self.cdist /= factor;
            if self.cdist_rem != 0 {
                self.cdist += 1;
            }
        }
    }

    fn scale_up(&mut self, factor: i32) {
        if self.dist > 0 || self.dist_rem != 0 {
            if self.dist_rem != 0 && !self.is_max_width() {
                self.dist -= 1;
            }
            self.dist = self.dist.saturating_mul(factor).saturating_add(self.dist_rem);
            self.dist_rem = 0;
        }
        if self.cdist > 0 || self.cdist_rem != 0 {
            if self.cdist_rem != 0 {
                self.cdist -= 1;
            }
            self.cdist = self.cdist.saturating_mul(factor);
            if self.is_area() {
                self.cdist = self.cdist.saturating_mul(factor);
            }
            self.cdist = self.cdist.saturating_add(self.cdist_rem);
            self.cdist_rem = 0;
        }
    }
}

impl RuleTable {
    /// Divides every distance by `factor`. Factors below 2 do nothing.
    pub(crate) fn scale_down(&mut self, factor: i32) {
        if factor <= 1 {
            return;
        }
        for rule in self.buckets_mut().flatten().flat_map(|rule| rule.edge_rules_mut()) {
            rule.scale_down(factor);
        }
    }

    /// Multiplies every distance by `factor`, restoring remainders.
    /// Factors below 2 do nothing.
    pub(crate) fn scale_up(&mut self, factor: i32) {
        if factor <= 1 {
            return;
        }
        for rule in self.buckets_mut().flatten().flat_map(|rule| rule.edge_rules_mut()) {
            rule.scale_up(factor);
        }
    }
}

/// `value * d / n`, clamped to the `i32` range.
fn mul_div(value: i32, d: i32, n: i32) -> i32 {
    let scaled = value as i64 * d as i64 / n as i64;
    scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.abs().max(1)
}

impl RuleStyle {
    /// Multiplies every distance by `d / n`.
    ///
    /// The scale factor is kept in lowest terms. Scaling by `n / d` later
    /// restores the previous distances exactly.
    pub fn rescale(&mut self, n: i32, d: i32) {
        if n == d {
            return;
        }
        if n <= 0 || d <= 0 {
            tracing::error!(n, d, "ignoring non-positive DRC rescale factor");
            return;
        }
        let (Some(scale_d), Some(scale_n)) =
            (self.scale_d.checked_mul(d), self.scale_n.checked_mul(n))
        else {
            tracing::error!(n, d, "ignoring DRC rescale factor that overflows the scale");
            return;
        };
        let _span = tracing::debug_span!("rescale", n, d).entered();

        self.rules.scale_up(self.scale_n);
        self.rules.scale_down(self.scale_d);

        let g = gcd(scale_d, scale_n);
        self.scale_d = scale_d / g;
        self.scale_n = scale_n / g;

        self.rules.scale_up(self.scale_d);
        self.rules.scale_down(self.scale_n);

        self.halo = mul_div(self.halo, d, n);
        self.step_size = mul_div(self.step_size, d, n);
        tracing::debug!(
            scale_n = self.scale_n,
            scale_d = self.scale_d,
            halo = self.halo,
            "rescaled DRC style"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Direction, RuleKind};
    use crate::types::TypeMask;
    use crate::why::WhyId;

    fn rule(dist: i32, cdist: i32, kind: RuleKind) -> EdgeRule {
        EdgeRule::new(
            Direction::Forward,
            dist,
            cdist,
            TypeMask::EMPTY,
            TypeMask::EMPTY,
            WhyId::default(),
        )
        .with_kind(kind)
    }

    #[test]
    fn scale_down_rounds_toward_safety() {
        let mut r = rule(7, 7, RuleKind::Edge);
        r.scale_down(3);
        assert_eq!((r.dist(), r.corner_dist()), (3, 3));
        assert_eq!((r.dist_remainder(), r.corner_remainder()), (1, 1));
        r.scale_up(3);
        assert_eq!((r.dist(), r.corner_dist()), (7, 7));

        let mut r = rule(7, 7, RuleKind::MaxWidth { bends: false });
        r.scale_down(3);
        assert_eq!(r.dist(), 2);
        r.scale_up(3);
        assert_eq!(r.dist(), 7);
    }

    #[test]
    fn area_scales_quadratically() {
        let mut r = rule(4, 20, RuleKind::Area);
        r.scale_down(2);
        assert_eq!((r.dist(), r.corner_dist()), (2, 5));
        r.scale_up(2);
        assert_eq!(r.corner_dist(), 20);

        let mut r = rule(4, 21, RuleKind::Area);
        r.scale_down(2);
        assert_eq!(r.corner_dist(), 6);
        r.scale_up(2);
        assert_eq!(r.corner_dist(), 21);
    }

    #[test]
    fn truncated_maximum_width_is_restored() {
        let mut r = rule(1, 0, RuleKind::MaxWidth { bends: true });
        r.scale_down(3);
        assert_eq!(r.dist(), 0);
        r.scale_up(3);
        assert_eq!(r.dist(), 1);
    }

    #[test]
    fn gcd_reduces() {
        assert_eq!(gcd(6, 4), 2);
        assert_eq!(gcd(3, 1), 1);
        assert_eq!(gcd(0, 5), 5);
    }
}
