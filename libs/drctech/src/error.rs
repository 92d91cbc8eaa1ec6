//! Error types.

use arcstr::ArcStr;

/// The reason a DRC rule line was rejected.
///
/// A rejected line leaves the rules table untouched.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum RuleError {
    #[error(transparent)]
    Layers(#[from] LayerExprError),
    #[error("all layers in {role} for \"{keyword}\" must be on the same plane")]
    NotCoplanar { keyword: ArcStr, role: LayerRole },
    #[error("types in {role} must either be in one plane or else must not share planes")]
    SharedPlanes { role: LayerRole },
    #[error("expected an integer, found `{value}`")]
    BadNumber { value: ArcStr },
    #[error("distance must not be negative, found {value}")]
    NegativeDistance { value: i32 },
    #[error("distance {value} is larger than the maximum of {max}")]
    DistanceTooLarge { value: i32, max: i32 },
    #[error("badly formed spacing line: need \"touching_ok\", \"touching_illegal\", or \"surround_ok\", found `{found}`")]
    BadAdjacency { found: ArcStr },
    #[error("unknown argument `{found}` in spacing line")]
    UnknownSpacingArgument { found: ArcStr },
    #[error("\"surround_ok\" requires surrounding types to be in the same plane")]
    SurroundOkMultiplane,
    #[error("widespacing checks cannot use \"surround_ok\"")]
    WideSurroundOk,
    #[error("spacing check with \"touching_ok\" must have all types in one plane; possibly you want \"surround_ok\"?")]
    TouchingOkAcrossPlanes,
    #[error("spacing check with \"corner_ok\" must have all types in one plane")]
    CornerOkNotCoplanar,
    #[error("all edges in edge rule must lie in shared planes")]
    EdgeNotCoplanar,
    #[error("corner types aren't in same plane as edges")]
    CornerTypesOffPlane,
    #[error("all OK types must lie in one plane")]
    OkTypesNotCoplanar,
    #[error("unknown presence option `{found}` in surround rule")]
    BadPresence { found: ArcStr },
    #[error("unknown option `{found}` in extend rule")]
    BadExtendOption { found: ArcStr },
    #[error("unknown bend option `{found}`")]
    BadBend { found: ArcStr },
    #[error("angles must be 45 or 90, found {found}")]
    BadAngle { found: i32 },
    #[error("bad [even|odd|any] selection `{found}` in rectangle rule")]
    BadParity { found: ArcStr },
    #[error("bad DRC rule type \"{keyword}\"; valid rule types are: {valid}")]
    UnknownKeyword { keyword: ArcStr, valid: ArcStr },
    #[error("rule type \"{keyword}\" usage: {keyword} {usage}")]
    Usage { keyword: ArcStr, usage: ArcStr },
    #[error("wrong number of arguments in {keyword} statement")]
    WrongArgCount { keyword: ArcStr },
}

/// Which argument of a rule a layer set came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LayerRole {
    /// The only layer set of a single-set rule.
    Layers,
    /// The first layer set.
    First,
    /// The second layer set.
    Second,
    /// The inside types of a surround rule.
    Inside,
    /// The outside types of a surround rule.
    Outside,
}

impl std::fmt::Display for LayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Layers => write!(f, "the layer set"),
            Self::First => write!(f, "the first set"),
            Self::Second => write!(f, "the second set"),
            Self::Inside => write!(f, "the inside types"),
            Self::Outside => write!(f, "the outside types"),
        }
    }
}

/// An error parsing or evaluating a layer expression.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum LayerExprError {
    #[error("unrecognized layer (type) name \"{name}\"")]
    UnknownName { name: ArcStr },
    #[error("unrecognized plane name \"{name}\"")]
    UnknownPlane { name: ArcStr },
    #[error("unmatched parenthesis in layer name \"{expr}\"")]
    UnmatchedParen { expr: ArcStr },
    #[error("malformed layer expression \"{expr}\"")]
    Syntax { expr: ArcStr },
}

/// An error building a [`TechDb`](crate::tech::TechDb).
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum TechDbError {
    #[error("name `{name}` is already in use")]
    DuplicateName { name: ArcStr },
    #[error("unknown plane `{name}`")]
    UnknownPlane { name: ArcStr },
    #[error("unknown type `{name}`")]
    UnknownType { name: ArcStr },
    #[error("contact `{name}` must have at least one residue layer")]
    NoResidues { name: ArcStr },
    #[error("`{name}` is a contact and cannot be a residue")]
    ContactResidue { name: ArcStr },
    #[error("too many tile types (at most {max})")]
    TooManyTypes { max: usize },
    #[error("too many planes (at most {max})")]
    TooManyPlanes { max: usize },
}

/// An error loading configuration or technology descriptions.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Tech(#[from] TechDbError),
}
