//! Issues reported while reading the DRC section of a technology.

use std::fmt::Display;

use arcstr::ArcStr;
use tracing::Level;

use crate::error::RuleError;

/// How serious a [`TechIssue`] is.
///
/// Errors reject a rule line but never abort technology loading.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The issues reported by a registry, with error and warning counts.
#[derive(Clone, Debug, Default)]
pub struct IssueSet {
    issues: Vec<TechIssue>,
    num_errors: usize,
    num_warnings: usize,
}

impl IssueSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, issue: TechIssue) {
        match issue.severity {
            Severity::Error => self.num_errors += 1,
            Severity::Warning => self.num_warnings += 1,
            Severity::Info => (),
        }
        self.issues.push(issue);
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TechIssue> {
        self.issues.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.num_errors > 0
    }

    #[inline]
    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    #[inline]
    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }
}

/// An issue found while reading the DRC section of a technology.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TechIssue {
    cause: Cause,
    severity: Severity,
    keyword: Option<ArcStr>,
}

/// The cause of a [`TechIssue`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Cause {
    /// A rule line was rejected and contributed nothing to the table.
    Rejected(RuleError),
    /// The two edge sets of an edge rule share a type.
    OverlappingEdgeSets,
    /// The inside and outside sets of an overhang rule share a type.
    OverlappingOverhangSets,
    /// The OK types of an edge rule are just `space`, so the edge plane is assumed.
    AmbiguousOkTypes { ok_types: ArcStr, plane: ArcStr },
    /// A deprecated plane argument disagrees with the OK types.
    IgnoredPlaneArgument { plane: ArcStr },
    /// `surround_ok` was used for types sharing a plane.
    SurroundOkSamePlane,
    /// A non-positive step size was requested.
    BadStepSize { value: i32 },
    /// An abnormally small step size was requested.
    SmallStepSize { value: i32 },
    /// A non-positive scale factor was requested.
    BadScaleFactor { numerator: i32, denominator: i32 },
    /// A style name prefix matched more than one style.
    AmbiguousStyle { name: ArcStr, styles: ArcStr },
    /// A style name prefix matched no style.
    UnknownStyle { name: ArcStr, styles: ArcStr },
}

impl TechIssue {
    #[inline]
    pub(crate) fn new(cause: Cause, severity: Severity, keyword: Option<ArcStr>) -> Self {
        Self {
            cause,
            severity,
            keyword,
        }
    }

    pub(crate) fn new_and_log(cause: Cause, severity: Severity, keyword: Option<ArcStr>) -> Self {
        let result = Self::new(cause, severity, keyword);
        let keyword = result.keyword.as_deref().unwrap_or("");
        match severity {
            Severity::Info => tracing::event!(Level::INFO, keyword, "{}", result),
            Severity::Warning => tracing::event!(Level::WARN, keyword, "{}", result),
            Severity::Error => tracing::event!(Level::ERROR, keyword, "{}", result),
        }
        result
    }

    /// The cause of this issue.
    #[inline]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    /// The rule keyword of the offending line, if any.
    #[inline]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// A hint on how to fix the offending line.
    pub fn help(&self) -> Option<&'static str> {
        match &self.cause {
            Cause::Rejected(RuleError::TouchingOkAcrossPlanes) => {
                Some("use \"surround_ok\" for types on different planes")
            }
            Cause::SurroundOkSamePlane => Some("did you mean \"touching_ok\"?"),
            _ => None,
        }
    }
}

impl Display for TechIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "{}", err),
            Self::OverlappingEdgeSets => write!(
                f,
                "types1 and types2 have nonempty intersection; DRC does not check edges with the same type on both sides"
            ),
            Self::OverlappingOverhangSets => write!(
                f,
                "inside and outside types have nonempty intersection; DRC does not check edges with the same type on both sides"
            ),
            Self::AmbiguousOkTypes { ok_types, plane } => write!(
                f,
                "OK types \"{}\" in more than one plane; assuming same plane ({}) as edge",
                ok_types, plane
            ),
            Self::IgnoredPlaneArgument { plane } => {
                write!(f, "ignoring bad plane argument `{}`", plane)
            }
            Self::SurroundOkSamePlane => write!(
                f,
                "\"surround_ok\" used when spacing rule types are in the same plane; treating as \"touching_ok\""
            ),
            Self::BadStepSize { value } => write!(
                f,
                "step size must be a positive integer, found {}; using automatic step size",
                value
            ),
            Self::SmallStepSize { value } => {
                write!(f, "abnormally small DRC step size ({})", value)
            }
            Self::BadScaleFactor {
                numerator,
                denominator,
            } => write!(
                f,
                "scale factor must be greater than 0, found {}/{}; setting scale factor to 1",
                numerator, denominator
            ),
            Self::AmbiguousStyle { name, styles } => write!(
                f,
                "DRC style \"{}\" is ambiguous; the DRC styles are: {}",
                name, styles
            ),
            Self::UnknownStyle { name, styles } => write!(
                f,
                "\"{}\" is not one of the known DRC styles: {}",
                name, styles
            ),
        }
    }
}

impl From<RuleError> for Cause {
    fn from(value: RuleError) -> Self {
        Self::Rejected(value)
    }
}
