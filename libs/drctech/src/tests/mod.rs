use crate::config::DrcConfig;
use crate::diagnostics::{Cause, Severity, TechIssue};
use crate::error::RuleError;
use crate::registry::DrcTech;
use crate::tech::TechDb;
use crate::types::{PlaneId, TileType};

pub(crate) mod optimize;
pub(crate) mod report;
pub(crate) mod scale;

/// A small CMOS-like technology.
///
/// `pc` joins poly to metal1 and `via` joins metal1 to metal2.
pub(crate) struct Fixture {
    pub(crate) tech: TechDb,
    pub(crate) active: PlaneId,
    pub(crate) metal1: PlaneId,
    pub(crate) metal2: PlaneId,
    pub(crate) poly: TileType,
    pub(crate) ndiff: TileType,
    pub(crate) nfet: TileType,
    pub(crate) m1: TileType,
    pub(crate) m2: TileType,
    pub(crate) pc: TileType,
    pub(crate) via: TileType,
}

pub(crate) fn fixture() -> Fixture {
    let mut b = TechDb::builder();
    let active = b.add_plane("active", &[]).unwrap();
    let metal1 = b.add_plane("metal1", &["m1plane"]).unwrap();
    let metal2 = b.add_plane("metal2", &[]).unwrap();
    let poly = b.add_layer("poly", "active", &["p"]).unwrap();
    let ndiff = b.add_layer("ndiff", "active", &[]).unwrap();
    let nfet = b.add_layer("nfet", "active", &[]).unwrap();
    let m1 = b.add_layer("m1", "metal1", &[]).unwrap();
    let m2 = b.add_layer("m2", "metal2", &[]).unwrap();
    let pc = b.add_contact("pc", &["poly", "m1"], &[]).unwrap();
    let via = b.add_contact("via", &["m1", "m2"], &[]).unwrap();
    b.paint_override("active", "poly", "ndiff", "nfet").unwrap();
    b.paint_override("active", "ndiff", "poly", "nfet").unwrap();
    Fixture {
        tech: b.build(),
        active,
        metal1,
        metal2,
        poly,
        ndiff,
        nfet,
        m1,
        m2,
        pc,
        via,
    }
}

/// Compiles `lines` into a fresh registry without finishing the section.
pub(crate) fn compile_lines(tech: TechDb, config: DrcConfig, lines: &[&[&str]]) -> DrcTech {
    let mut drc = DrcTech::new(tech, config);
    for line in lines {
        assert!(drc.tech_line(*line));
    }
    drc
}

/// Compiles `lines` with the default configuration.
pub(crate) fn compile(lines: &[&[&str]]) -> DrcTech {
    compile_lines(fixture().tech, DrcConfig::default(), lines)
}

/// The rule errors reported so far.
pub(crate) fn rule_errors(drc: &DrcTech) -> Vec<RuleError> {
    drc.issues()
        .iter()
        .filter_map(|issue| match issue.cause() {
            Cause::Rejected(err) => Some(err.clone()),
            _ => None,
        })
        .collect()
}

/// The issues of the given severity reported so far.
pub(crate) fn issues_with(drc: &DrcTech, severity: Severity) -> Vec<&TechIssue> {
    drc.issues()
        .iter()
        .filter(|issue| issue.severity() == severity)
        .collect()
}
