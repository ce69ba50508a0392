//! Version parsing and ordering for feature gates.
//!
//! Accepts `MAJOR[.MINOR[.PATCH]]` with an optional leading `v`, an optional
//! `-pre.release` suffix, and optional `+build` metadata (ignored). Ordering
//! follows semantic-versioning precedence, so a release sorts above its own
//! pre-releases and `4.14.0-0` is the lowest 4.14 version.

use std::cmp::Ordering;
use std::str::FromStr;

/// A version string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{input}': {reason}")]
pub struct VersionParseError {
    pub input: String,
    pub reason: String,
}

impl VersionParseError {
    pub fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// One dot-separated pre-release identifier. Numeric sorts below alphanumeric.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PreId {
    Numeric(u64),
    Alpha(String),
}

/// Parsed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pre: Vec<PreId>,
}

impl Version {
    /// Whether the version carries a pre-release suffix.
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

fn parse_component(input: &str, part: &str, name: &str) -> Result<u64, VersionParseError> {
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return Err(VersionParseError::new(
            input,
            format!("{} component '{}' is not a number", name, part),
        ));
    }
    part.parse::<u64>()
        .map_err(|e| VersionParseError::new(input, format!("{} component: {}", name, e)))
}

fn parse_pre(input: &str, pre: &str) -> Result<Vec<PreId>, VersionParseError> {
    pre.split('.')
        .map(|id| {
            if id.is_empty() {
                return Err(VersionParseError::new(input, "empty pre-release identifier"));
            }
            if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(VersionParseError::new(
                    input,
                    format!("invalid pre-release identifier '{}'", id),
                ));
            }
            if id.chars().all(|c| c.is_ascii_digit()) {
                id.parse::<u64>()
                    .map(PreId::Numeric)
                    .map_err(|e| VersionParseError::new(input, e.to_string()))
            } else {
                Ok(PreId::Alpha(id.to_string()))
            }
        })
        .collect()
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let unprefixed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let without_build = match unprefixed.split_once('+') {
            Some((v, build)) if !build.is_empty() => v,
            Some(_) => return Err(VersionParseError::new(input, "empty build metadata")),
            None => unprefixed,
        };
        let (core, pre) = match without_build.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (without_build, None),
        };
        if core.is_empty() {
            return Err(VersionParseError::new(input, "missing version number"));
        }

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionParseError::new(
                input,
                "expected at most MAJOR.MINOR.PATCH",
            ));
        }
        let major = parse_component(input, parts[0], "major")?;
        let minor = match parts.get(1) {
            Some(p) => parse_component(input, p, "minor")?,
            None => 0,
        };
        let patch = match parts.get(2) {
            Some(p) => parse_component(input, p, "patch")?,
            None => 0,
        };
        let pre = match pre {
            Some(pre) => parse_pre(input, pre)?,
            None => Vec::new(),
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let tuple_cmp =
            (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch));
        if tuple_cmp != Ordering::Equal {
            return tuple_cmp;
        }
        // Same numeric version: pre-release < release
        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => self.pre.cmp(&other.pre),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Whether `candidate` is at or above `baseline`.
///
/// # Errors
///
/// `VersionParseError` if either operand does not parse.
pub fn is_greater_or_equal(candidate: &str, baseline: &str) -> Result<bool, VersionParseError> {
    let candidate: Version = candidate.parse()?;
    let baseline: Version = baseline.parse()?;
    Ok(candidate >= baseline)
}
