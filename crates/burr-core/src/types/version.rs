//! npm-style version ranges.
//!
//! `semver` provides `Version` and `VersionReq`; registry documents however speak
//! npm's range dialect (`||` alternatives, space separated comparators, hyphen
//! ranges, bare exact versions). `Range` translates that dialect into one
//! `VersionReq` per alternative and keeps the source expression for display and
//! de-duplication.

use semver::VersionReq;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

pub use semver::Version;

use crate::error::BurrError;

/// A version range expression as declared by a dependent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Range {
    raw: String,
    alternatives: Vec<VersionReq>,
}

/// Range parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid comparator '{comparator}': {reason}")]
    InvalidComparator {
        range: String,
        comparator: String,
        reason: String,
    },

    #[error("operator '{op}' is not followed by a version")]
    DanglingOperator { range: String, op: String },

    #[error("hyphen range needs a version on both sides")]
    IncompleteHyphen { range: String },
}

impl RangeError {
    /// The expression that failed to parse
    pub fn range(&self) -> &str {
        match self {
            RangeError::InvalidComparator { range, .. }
            | RangeError::DanglingOperator { range, .. }
            | RangeError::IncompleteHyphen { range } => range,
        }
    }
}

impl From<RangeError> for BurrError {
    fn from(error: RangeError) -> Self {
        BurrError::InvalidRange {
            range: error.range().to_string(),
            reason: error.to_string(),
        }
    }
}

const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "^", "~"];

impl Range {
    /// The range matching every release version
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            alternatives: vec![VersionReq::STAR],
        }
    }

    /// Parse an npm range expression
    pub fn parse(input: &str) -> Result<Self, RangeError> {
        let trimmed = input.trim();
        let raw = if trimmed.is_empty() { "*" } else { trimmed };

        let mut alternatives = Vec::new();
        for set in raw.split("||") {
            let set = set.trim();
            let translated = translate_set(raw, set)?;
            let req = VersionReq::parse(&translated).map_err(|e| RangeError::InvalidComparator {
                range: raw.to_string(),
                comparator: set.to_string(),
                reason: e.to_string(),
            })?;
            alternatives.push(req);
        }

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// The expression this range was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check if a version satisfies any alternative of this range
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Check if this range places no constraint on release versions
    pub fn is_any(&self) -> bool {
        self.alternatives.iter().any(|req| req.comparators.is_empty())
    }
}

/// Render ranges the way conflicts and errors print them: `^1.0.0, ^2.0.0`
pub fn format_ranges(ranges: &[Range]) -> String {
    ranges
        .iter()
        .map(Range::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_any_token(set: &str) -> bool {
    matches!(set, "" | "*" | "x" | "X" | "latest")
}

/// Translate one `||` alternative into `semver` comparator syntax
fn translate_set(range: &str, set: &str) -> Result<String, RangeError> {
    if is_any_token(set) {
        return Ok("*".to_string());
    }

    if let Some((low, high)) = set.split_once(" - ") {
        let low = trim_wildcards(strip_v(low.trim()));
        let high = trim_wildcards(strip_v(high.trim()));
        return match (low.is_empty(), high.is_empty()) {
            (true, true) => Ok("*".to_string()),
            (false, true) => Ok(format!(">={}", low)),
            (true, false) => Ok(format!("<={}", high)),
            (false, false) => Ok(format!(">={}, <={}", low, high)),
        };
    }
    if set.starts_with('-') || set.ends_with('-') {
        return Err(RangeError::IncompleteHyphen {
            range: range.to_string(),
        });
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in set.split_whitespace() {
        if let Some(op) = pending_op.take() {
            if let Some(comparator) = translate_comparator(op, token) {
                comparators.push(comparator);
            }
            continue;
        }

        let (op, version) = split_operator(token);
        if version.is_empty() {
            pending_op = Some(op);
            continue;
        }
        if let Some(comparator) = translate_comparator(op, version) {
            comparators.push(comparator);
        }
    }

    if let Some(op) = pending_op {
        return Err(RangeError::DanglingOperator {
            range: range.to_string(),
            op: op.to_string(),
        });
    }

    if comparators.is_empty() {
        Ok("*".to_string())
    } else {
        Ok(comparators.join(", "))
    }
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

/// Returns `None` when the comparator admits every version (`>=*`, `x`)
fn translate_comparator(op: &str, version: &str) -> Option<String> {
    let version = trim_wildcards(strip_v(version));
    if version.is_empty() {
        return None;
    }

    // npm: a bare version is exact, `semver` would read it as a caret
    let op = match op {
        "" => "=",
        "~>" => "~",
        other => other,
    };
    Some(format!("{}{}", op, version))
}

fn strip_v(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// `1.x` -> `1`, `1.2.*` -> `1.2`, `*` -> ``
fn trim_wildcards(version: &str) -> String {
    version
        .split('.')
        .take_while(|part| !is_any_token(part))
        .collect::<Vec<_>>()
        .join(".")
}

impl FromStr for Range {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Range::parse(s)
    }
}

impl TryFrom<String> for Range {
    type Error = RangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Range::parse(&value)
    }
}

impl From<Range> for String {
    fn from(range: Range) -> Self {
        range.raw
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Range {}

impl Hash for Range {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for Range {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Range {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}
