//! The DRC section of a technology and its named styles.

use std::io::Write;

use arcstr::ArcStr;
use nom::branch::alt;
use nom::bytes::complete::{take_till, take_till1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::all_consuming;
use nom::multi::separated_list0;
use nom::sequence::delimited;
use nom::IResult;

use crate::compile::Compiler;
use crate::config::DrcConfig;
use crate::diagnostics::{Cause, IssueSet, Severity, TechIssue};
use crate::error::RuleError;
use crate::style::{RuleStyle, StyleStatus};
use crate::tech::TechDb;

/// A source of DRC section lines that can be replayed when a style is loaded.
pub trait DrcSection {
    /// The tokenized lines of the DRC section, in order.
    fn lines(&self) -> &[Vec<ArcStr>];

    /// The current lambda scale as `(numerator, denominator)`.
    fn lambda(&self) -> (i32, i32);
}

/// A DRC section held in memory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedSection {
    lines: Vec<Vec<ArcStr>>,
    lambda: (i32, i32),
}

impl Default for RecordedSection {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            lambda: (1, 1),
        }
    }
}

impl RecordedSection {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lambda scale applied after a style is loaded.
    pub fn with_lambda(mut self, n: i32, d: i32) -> Self {
        self.lambda = (n, d);
        self
    }

    /// Appends a line.
    pub fn push<S: AsRef<str>>(&mut self, argv: &[S]) {
        self.lines
            .push(argv.iter().map(|arg| ArcStr::from(arg.as_ref())).collect());
    }

    /// Tokenizes each line of `text` and appends it.
    ///
    /// Tokens are separated by whitespace, and a double-quoted string is a
    /// single token. Blank lines and lines starting with `#` are skipped.
    pub fn push_text(&mut self, text: &str) {
        for line in text.lines() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            let argv = tokenize(line);
            if !argv.is_empty() {
                self.push(argv.as_slice());
            }
        }
    }
}

fn token(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        take_till1(|c: char| c.is_whitespace()),
    ))(input)
}

/// Splits a section line into tokens.
pub(crate) fn tokenize(line: &str) -> Vec<&str> {
    let tokens = delimited(multispace0, separated_list0(multispace1, token), multispace0);
    all_consuming(tokens)(line)
        .map(|(_, argv)| argv)
        .unwrap_or_else(|_: nom::Err<nom::error::Error<&str>>| line.split_whitespace().collect())
}

impl DrcSection for RecordedSection {
    fn lines(&self) -> &[Vec<ArcStr>] {
        &self.lines
    }

    fn lambda(&self) -> (i32, i32) {
        self.lambda
    }
}

/// The DRC technology: the declared styles and the one currently compiled.
#[derive(Debug)]
pub struct DrcTech {
    tech: TechDb,
    config: DrcConfig,
    styles: Vec<ArcStr>,
    current: Option<RuleStyle>,
    issues: IssueSet,
}

impl DrcTech {
    /// Creates a registry with no declared styles and an unnamed current style.
    pub fn new(tech: TechDb, config: DrcConfig) -> Self {
        let current = Some(RuleStyle::new(None, &tech));
        Self {
            tech,
            config,
            styles: Vec::new(),
            current,
            issues: IssueSet::new(),
        }
    }

    /// Discards every style, as on a technology reload.
    ///
    /// Lines are refused until [`DrcTech::begin_section`] is called.
    pub fn reset(&mut self) {
        self.current = None;
        self.styles.clear();
    }

    /// Clears the current style's tables at the start of a DRC section,
    /// keeping its name.
    pub fn begin_section(&mut self) {
        let name = self.current.take().and_then(|style| style.name);
        self.current = Some(RuleStyle::new(name, &self.tech));
    }

    #[inline]
    pub fn tech(&self) -> &TechDb {
        &self.tech
    }

    #[inline]
    pub fn config(&self) -> &DrcConfig {
        &self.config
    }

    /// The current style, if any.
    #[inline]
    pub fn style(&self) -> Option<&RuleStyle> {
        self.current.as_ref()
    }

    /// The names of every declared style, in declaration order.
    pub fn style_names(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|name| name.as_str())
    }

    pub fn current_style_name(&self) -> Option<&str> {
        self.current.as_ref().and_then(|style| style.name())
    }

    #[inline]
    pub fn issues(&self) -> &IssueSet {
        &self.issues
    }

    /// Removes and returns every issue reported so far.
    pub fn take_issues(&mut self) -> IssueSet {
        std::mem::take(&mut self.issues)
    }

    fn style_list(&self, sep: &str) -> String {
        self.style_names().collect::<Vec<_>>().join(sep)
    }

    fn report(&mut self, cause: Cause, severity: Severity, keyword: Option<&str>) {
        self.issues.add(TechIssue::new_and_log(
            cause,
            severity,
            keyword.map(ArcStr::from),
        ));
    }

    /// Processes one line of the DRC section.
    ///
    /// Returns `false` only when there is no current style, in which case
    /// no further lines should be fed. Rejected lines are reported as issues.
    pub fn tech_line<S: AsRef<str>>(&mut self, argv: &[S]) -> bool {
        let argv: Vec<&str> = argv.iter().map(|arg| arg.as_ref()).collect();
        let Some(&keyword) = argv.first() else {
            return true;
        };
        if keyword == "style" {
            self.style_line(&argv);
            return true;
        }

        let Some(status) = self.current.as_ref().map(|style| style.status) else {
            return false;
        };

        // Lines before any style declaration belong to a default style.
        if self.styles.is_empty() {
            if !self.tech_line(&["style", "default"]) {
                return false;
            }
        } else if self.styles.len() == 1 && status != StyleStatus::Suspended {
            self.set_status(StyleStatus::Pending);
        }

        let status = self.status();
        if !matches!(status, StyleStatus::Pending | StyleStatus::Suspended) {
            return true;
        }

        if keyword == "scalefactor" {
            self.scale_factor_line(&argv);
            return true;
        }
        if keyword.starts_with("variant") {
            self.variant_line(&argv);
            return true;
        }
        if self.status() != StyleStatus::Pending {
            return true;
        }
        self.add_rule(&argv);
        true
    }

    fn status(&self) -> StyleStatus {
        self.current
            .as_ref()
            .map(|style| style.status)
            .unwrap_or_default()
    }

    fn set_status(&mut self, status: StyleStatus) {
        if let Some(style) = self.current.as_mut() {
            style.status = status;
        }
    }

    fn style_line(&mut self, argv: &[&str]) {
        let variants: Option<Vec<&str>> = match argv.len() {
            2 => None,
            4 if argv[2].starts_with("variant") => {
                Some(argv[3].split(',').filter(|v| !v.is_empty()).collect())
            }
            _ => {
                self.report(
                    RuleError::WrongArgCount {
                        keyword: argv[0].into(),
                    }
                    .into(),
                    Severity::Error,
                    Some(argv[0]),
                );
                return;
            }
        };
        let base = argv[1];

        // A declared style with this prefix means the section is being replayed.
        let declared = self
            .styles
            .iter()
            .find(|name| name.starts_with(base))
            .cloned();
        let new_style = match declared {
            Some(name) => name,
            None => {
                let names: Vec<ArcStr> = match &variants {
                    None => vec![base.into()],
                    Some(variants) => variants
                        .iter()
                        .map(|v| ArcStr::from(format!("{base}{v}")))
                        .collect(),
                };
                let first = names.first().cloned().unwrap_or_else(|| base.into());
                tracing::debug!(styles = ?names, "declared DRC styles");
                self.styles.extend(names);
                first
            }
        };

        if self.current.is_none() {
            let mut style = RuleStyle::new(Some(new_style), &self.tech);
            style.status = StyleStatus::Pending;
            self.current = Some(style);
            return;
        }
        let Some(style) = self.current.as_mut() else {
            return;
        };
        match style.status {
            StyleStatus::Pending | StyleStatus::Suspended => style.status = StyleStatus::Loaded,
            StyleStatus::NotLoaded => match style.name.clone() {
                None => {
                    style.name = Some(new_style);
                    style.status = StyleStatus::Pending;
                }
                Some(name) => {
                    let selected = match &variants {
                        None => name.as_str() == base,
                        Some(variants) => name
                            .strip_prefix(base)
                            .is_some_and(|suffix| variants.contains(&suffix)),
                    };
                    if selected {
                        style.status = StyleStatus::Pending;
                    }
                }
            },
            StyleStatus::Loaded => {}
        }
    }

    fn scale_factor_line(&mut self, argv: &[&str]) {
        if argv.len() != 2 && argv.len() != 3 {
            self.report(
                RuleError::WrongArgCount {
                    keyword: argv[0].into(),
                }
                .into(),
                Severity::Error,
                Some(argv[0]),
            );
            return;
        }
        let parse = |value: &str| value.trim().parse::<f64>().map(|v| v as i32).unwrap_or(0);
        let n = parse(argv[1]);
        let d = argv.get(2).map(|value| parse(value)).unwrap_or(1);
        let (n, d) = if n <= 0 || d <= 0 {
            self.report(
                Cause::BadScaleFactor {
                    numerator: n,
                    denominator: d,
                },
                Severity::Error,
                Some(argv[0]),
            );
            (1, 1)
        } else {
            (n, d)
        };
        if let Some(style) = self.current.as_mut() {
            style.scale_n = n;
            style.scale_d = d;
        }
    }

    fn variant_line(&mut self, argv: &[&str]) {
        if argv.len() != 2 {
            self.report(
                RuleError::WrongArgCount {
                    keyword: argv[0].into(),
                }
                .into(),
                Severity::Error,
                Some(argv[0]),
            );
            return;
        }
        let Some(style) = self.current.as_mut() else {
            return;
        };
        let name = style.name().unwrap_or("");
        let selected = argv[1]
            .split(',')
            .map(|item| item.trim_end())
            .any(|item| item.starts_with('*') || name.ends_with(item));
        style.status = if selected {
            StyleStatus::Pending
        } else {
            StyleStatus::Suspended
        };
    }

    fn add_rule(&mut self, argv: &[&str]) {
        let Some(style) = self.current.as_mut() else {
            return;
        };
        style.rules_specified += 1;
        let mut compiler = Compiler::new(&self.tech, &self.config, style, &mut self.issues);
        let result = compiler.compile(argv);
        let keyword: ArcStr = match compiler.keyword() {
            "" => argv[0].into(),
            keyword => keyword.into(),
        };
        match result {
            Ok(dist) => style.note_distance(dist),
            Err(err) => {
                self.issues.add(TechIssue::new_and_log(
                    Cause::Rejected(err),
                    Severity::Error,
                    Some(keyword),
                ));
            }
        }
    }

    /// Ends the DRC section and finalizes the current style.
    ///
    /// A technology without style declarations gets a `default` style.
    pub fn finish(&mut self) {
        if self.styles.is_empty() {
            let name = arcstr::literal!("default");
            self.styles.push(name.clone());
            let mut style = RuleStyle::new(Some(name), &self.tech);
            style.status = StyleStatus::Loaded;
            self.current = Some(style);
        }
        let Some(style) = self.current.as_mut() else {
            tracing::error!("no current DRC style to finalize");
            return;
        };
        style.finalize(&self.tech, &self.config);
        tracing::info!(
            style = style.name().unwrap_or(""),
            halo = style.halo(),
            edge_rules = style.rules().num_edge_rules(),
            "loaded DRC style"
        );
    }

    /// Rescales the current style by `d / n`.
    pub fn rescale(&mut self, n: i32, d: i32) {
        if let Some(style) = self.current.as_mut() {
            style.rescale(n, d);
        }
    }

    /// Compiles the style `name` from `source`, replacing the current style.
    ///
    /// Does nothing if `name` is already the current style.
    pub fn load_style(&mut self, name: &str, source: &impl DrcSection) {
        if self.current_style_name() == Some(name) {
            return;
        }
        let _span = tracing::info_span!("load_drc_style", style = name).entered();
        self.current = Some(RuleStyle::new(Some(name.into()), &self.tech));

        for line in source.lines() {
            if !self.tech_line(line.as_slice()) {
                break;
            }
        }
        self.finish();
        let (n, d) = source.lambda();
        self.rescale(n, d);
    }

    /// Recompiles the current style from `source`.
    pub fn reload_current_style(&mut self, source: &impl DrcSection) {
        let Some(name) = self.current_style_name().map(ArcStr::from) else {
            return;
        };
        if !self.styles.contains(&name) {
            return;
        }
        if let Some(style) = self.current.as_mut() {
            style.name = None;
        }
        self.load_style(&name, source);
    }

    /// Selects the style named by `name` or by a unique prefix of it.
    ///
    /// Unknown or ambiguous names are reported and leave the current style
    /// in place.
    pub fn set_style(&mut self, name: &str, source: &impl DrcSection) {
        let exact = self.styles.iter().find(|style| style.as_str() == name);
        let found = match exact {
            Some(style) => Ok(style.clone()),
            None => {
                let mut matches = self.styles.iter().filter(|style| style.starts_with(name));
                match (matches.next(), matches.next()) {
                    (Some(style), None) => Ok(style.clone()),
                    (Some(_), Some(_)) => Err(Cause::AmbiguousStyle {
                        name: name.into(),
                        styles: self.style_list(", ").into(),
                    }),
                    (None, _) => Err(Cause::UnknownStyle {
                        name: name.into(),
                        styles: self.style_list(", ").into(),
                    }),
                }
            }
        };
        match found {
            Ok(style) => {
                self.load_style(&style, source);
                tracing::info!(style = %style, "DRC style is now \"{}\"", style);
            }
            Err(cause) => self.report(cause, Severity::Error, None),
        }
    }

    /// Prints the current style and/or the declared styles.
    ///
    /// With `list`, names are printed bare and space separated.
    pub fn print_styles(
        &self,
        w: &mut impl Write,
        list: bool,
        all: bool,
        current: bool,
    ) -> std::io::Result<()> {
        if current {
            match self.current_style_name() {
                None => writeln!(w, "Error: No style is set")?,
                Some(name) if list => write!(w, "{name}")?,
                Some(name) => writeln!(w, "The current style is \"{name}\".")?,
            }
        }
        if all {
            if list {
                write!(w, "{}", self.style_list(" "))?;
            } else {
                writeln!(w, "The DRC styles are: {}.", self.style_list(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_tokens_stay_whole() {
        assert_eq!(
            tokenize("  width m1 3 \"m1 width < 3\" "),
            vec!["width", "m1", "3", "m1 width < 3"]
        );
        assert_eq!(tokenize("spacing\tm1 m1  4"), vec!["spacing", "m1", "m1", "4"]);
        assert_eq!(tokenize("why \"\""), vec!["why", ""]);
        assert!(tokenize("   ").is_empty());
    }
}
