//! Compilation of DRC rule lines into edge rules.
//!
//! Each keyword compiler validates its whole line before touching the
//! style, so a rejected line contributes nothing. A compiler returns the
//! largest distance it introduced, which feeds the style's halo.

mod basic;
mod edge;
mod spacing;
mod surround;

use arcstr::ArcStr;

use crate::config::DrcConfig;
use crate::diagnostics::{Cause, IssueSet, Severity, TechIssue};
use crate::error::{LayerRole, RuleError};
use crate::layers::name_mask;
use crate::rule::{Rule, MAX_DISTANCE};
use crate::style::RuleStyle;
use crate::tech::TechDb;
use crate::types::{coincident_planes, lowest_plane, PlaneId, PlaneMask, TileType, TypeMask};
use crate::why::WhyId;

type CompileFn = fn(&mut Compiler<'_>, &[&str]) -> Result<i32, RuleError>;

/// A DRC rule keyword.
pub(crate) struct RuleKey {
    pub(crate) keyword: &'static str,
    /// Argument counts include the keyword itself.
    pub(crate) min_args: usize,
    pub(crate) max_args: usize,
    pub(crate) usage: &'static str,
    compile: CompileFn,
}

pub(crate) const RULE_KEYS: &[RuleKey] = &[
    RuleKey {
        keyword: "angles",
        min_args: 4,
        max_args: 4,
        usage: "layers 45|90 why",
        compile: basic::angles,
    },
    RuleKey {
        keyword: "area",
        min_args: 5,
        max_args: 5,
        usage: "layers area horizon why",
        compile: basic::area,
    },
    RuleKey {
        keyword: "edge",
        min_args: 8,
        max_args: 9,
        usage: "layers1 layers2 distance okTypes cornerTypes cornerDistance why [plane]",
        compile: edge::edge,
    },
    RuleKey {
        keyword: "edge4way",
        min_args: 8,
        max_args: 9,
        usage: "layers1 layers2 distance okTypes cornerTypes cornerDistance why [plane]",
        compile: edge::edge4way,
    },
    RuleKey {
        keyword: "exact_overlap",
        min_args: 2,
        max_args: 2,
        usage: "layers",
        compile: basic::exact_overlap,
    },
    RuleKey {
        keyword: "extend",
        min_args: 5,
        max_args: 6,
        usage: "layers1 layers2 distance [exact_width] why",
        compile: edge::extend,
    },
    RuleKey {
        keyword: "maxwidth",
        min_args: 4,
        max_args: 5,
        usage: "layers maxWidth bends why",
        compile: basic::max_width,
    },
    RuleKey {
        keyword: "no_overlap",
        min_args: 3,
        max_args: 3,
        usage: "layers1 layers2",
        compile: basic::no_overlap,
    },
    RuleKey {
        keyword: "overhang",
        min_args: 5,
        max_args: 5,
        usage: "layers2 layers1 distance why",
        compile: edge::overhang,
    },
    RuleKey {
        keyword: "rect_only",
        min_args: 3,
        max_args: 3,
        usage: "layers why",
        compile: basic::rect_only,
    },
    RuleKey {
        keyword: "rectangle",
        min_args: 5,
        max_args: 5,
        usage: "layers maxwidth [even|odd|any] why",
        compile: basic::rectangle,
    },
    RuleKey {
        keyword: "spacing",
        min_args: 6,
        max_args: 7,
        usage: "layers1 layers2 separation [layers3] adjacency why",
        compile: spacing::spacing,
    },
    RuleKey {
        keyword: "stepsize",
        min_args: 2,
        max_args: 2,
        usage: "step_size",
        compile: basic::step_size,
    },
    RuleKey {
        keyword: "surround",
        min_args: 6,
        max_args: 6,
        usage: "layers1 layers2 distance presence why",
        compile: surround::surround,
    },
    RuleKey {
        keyword: "widespacing",
        min_args: 7,
        max_args: 7,
        usage: "layers1 width layers2 separation adjacency why",
        compile: spacing::wide_spacing,
    },
    RuleKey {
        keyword: "width",
        min_args: 4,
        max_args: 4,
        usage: "layers width why",
        compile: basic::width,
    },
];

/// Finds the rule keyword named by `name` or by a unique prefix of it.
pub(crate) fn lookup_keyword(name: &str) -> Result<&'static RuleKey, RuleError> {
    if let Some(key) = RULE_KEYS.iter().find(|key| key.keyword == name) {
        return Ok(key);
    }
    let mut matches = RULE_KEYS.iter().filter(|key| key.keyword.starts_with(name));
    match (matches.next(), matches.next()) {
        (Some(key), None) if !name.is_empty() => Ok(key),
        _ => Err(RuleError::UnknownKeyword {
            keyword: name.into(),
            valid: RULE_KEYS
                .iter()
                .map(|key| key.keyword)
                .collect::<Vec<_>>()
                .join(", ")
                .into(),
        }),
    }
}

/// Iterates over every ordered pair of distinct types, first type outermost.
pub(crate) fn type_pairs(tech: &TechDb) -> impl Iterator<Item = (TileType, TileType)> + '_ {
    tech.types()
        .flat_map(move |i| tech.types().map(move |j| (i, j)))
        .filter(|(i, j)| i != j)
}

/// The state shared by the keyword compilers while compiling one line.
pub(crate) struct Compiler<'a> {
    pub(crate) tech: &'a TechDb,
    pub(crate) config: &'a DrcConfig,
    pub(crate) style: &'a mut RuleStyle,
    issues: &'a mut IssueSet,
    key: Option<&'static RuleKey>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(
        tech: &'a TechDb,
        config: &'a DrcConfig,
        style: &'a mut RuleStyle,
        issues: &'a mut IssueSet,
    ) -> Self {
        Self {
            tech,
            config,
            style,
            issues,
            key: None,
        }
    }

    /// Compiles one rule line, returning the largest distance it introduced.
    pub(crate) fn compile(&mut self, argv: &[&str]) -> Result<i32, RuleError> {
        let Some(name) = argv.first() else {
            return Ok(0);
        };
        let key = lookup_keyword(name)?;
        self.key = Some(key);
        if argv.len() < key.min_args || argv.len() > key.max_args {
            return Err(self.usage_error());
        }
        let _span = tracing::trace_span!("compile_rule", keyword = key.keyword).entered();
        (key.compile)(self, argv)
    }

    /// The canonical keyword of the line being compiled.
    pub(crate) fn keyword(&self) -> &'static str {
        self.key.map(|key| key.keyword).unwrap_or("")
    }

    pub(crate) fn usage_error(&self) -> RuleError {
        RuleError::Usage {
            keyword: self.keyword().into(),
            usage: self.key.map(|key| key.usage).unwrap_or("").into(),
        }
    }

    fn report(&mut self, cause: Cause, severity: Severity) {
        let keyword = Some(ArcStr::from(self.keyword()));
        self.issues
            .add(TechIssue::new_and_log(cause, severity, keyword));
    }

    pub(crate) fn warn(&mut self, cause: Cause) {
        self.report(cause, Severity::Warning);
    }

    pub(crate) fn error(&mut self, cause: Cause) {
        self.report(cause, Severity::Error);
    }

    /// Evaluates a layer expression.
    pub(crate) fn layers(&self, expr: &str) -> Result<(TypeMask, PlaneMask), RuleError> {
        Ok(name_mask(self.tech, expr)?)
    }

    /// The planes of `planes` shared by every type in `types`.
    pub(crate) fn coincident(&self, types: &TypeMask, planes: PlaneMask) -> PlaneMask {
        coincident_planes(types, planes, self.tech.num_types(), |t| {
            self.tech.planes_of(t)
        })
    }

    /// Evaluates a layer expression whose types must share a plane,
    /// returning the types and the planes they share.
    pub(crate) fn coplanar(
        &self,
        expr: &str,
        role: LayerRole,
    ) -> Result<(TypeMask, PlaneMask), RuleError> {
        let (types, planes) = self.layers(expr)?;
        let shared = self.coincident(&types, planes);
        if shared.is_empty() {
            return Err(RuleError::NotCoplanar {
                keyword: self.keyword().into(),
                role,
            });
        }
        Ok((types, shared))
    }

    /// Parses an integer argument.
    pub(crate) fn integer(&self, value: &str) -> Result<i32, RuleError> {
        value.trim().parse().map_err(|_| RuleError::BadNumber {
            value: value.into(),
        })
    }

    /// Parses a distance argument in `0..=MAX_DISTANCE`.
    pub(crate) fn distance(&self, value: &str) -> Result<i32, RuleError> {
        let value = self.integer(value)?;
        if value < 0 {
            return Err(RuleError::NegativeDistance { value });
        }
        if value > MAX_DISTANCE {
            return Err(RuleError::DistanceTooLarge {
                value,
                max: MAX_DISTANCE,
            });
        }
        Ok(value)
    }

    #[inline]
    pub(crate) fn lowest(&self, planes: PlaneMask) -> PlaneId {
        lowest_plane(planes, self.tech.num_planes())
    }

    /// The planes of `mask` holding both `i` and `j`.
    #[inline]
    pub(crate) fn shared(&self, i: TileType, j: TileType, mask: PlaneMask) -> PlaneMask {
        self.tech.types_on_same_plane(i, j) & mask
    }

    #[inline]
    pub(crate) fn plane_types(&self, plane: PlaneId) -> TypeMask {
        self.tech.plane_types(plane)
    }

    pub(crate) fn why(&mut self, why: &str) -> WhyId {
        self.style.whys.intern(why)
    }

    pub(crate) fn insert(&mut self, from: TileType, to: TileType, rule: impl Into<Rule>) {
        self.style.rules.insert(from, to, rule);
    }
}
