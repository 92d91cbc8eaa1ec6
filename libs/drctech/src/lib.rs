//! Compiles the DRC section of a layout technology into edge-rule tables.
//!
//! Each line of the section names a rule keyword (`width`, `spacing`,
//! `surround`, ...) and its arguments. [`DrcTech::tech_line`] compiles the
//! lines belonging to the selected style into a [`RuleTable`] of edge rules:
//! for every ordered pair of tile types, a list of constraints checked on
//! edges between the two types, ordered by distance. Once the section ends,
//! [`DrcTech::finish`] normalizes distances to the style's scale factor,
//! computes the interaction halo and prunes redundant rules.
//!
//! ```
//! use drctech::{DrcConfig, DrcTech, TechDb};
//!
//! let mut b = TechDb::builder();
//! b.add_plane("metal1", &[]).unwrap();
//! let m1 = b.add_layer("m1", "metal1", &[]).unwrap();
//! let mut drc = DrcTech::new(b.build(), DrcConfig::default());
//!
//! drc.tech_line(&["width", "m1", "3", "metal1 width < 3"]);
//! drc.finish();
//!
//! assert_eq!(drc.default_layer_width(m1), 3);
//! assert_eq!(drc.style().unwrap().halo(), 3);
//! ```

mod compile;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod layers;
mod optimize;
pub mod paint;
pub mod registry;
pub mod report;
pub mod rule;
mod scale;
pub mod style;
pub mod table;
pub mod tech;
pub mod types;
pub mod why;

#[cfg(test)]
pub(crate) mod tests;

pub use config::DrcConfig;
pub use diagnostics::{Cause, IssueSet, Severity, TechIssue};
pub use error::{ConfigError, LayerExprError, LayerRole, RuleError, TechDbError};
pub use registry::{DrcSection, DrcTech, RecordedSection};
pub use report::RuleStats;
pub use rule::{AngleLimit, Direction, EdgeRule, Parity, Rule, RuleKind, MAX_DISTANCE};
pub use style::{RuleStyle, StyleStatus};
pub use table::RuleTable;
pub use tech::{TechDb, TechDesc};
pub use types::{PlaneId, PlaneMask, TileType, TypeMask};
