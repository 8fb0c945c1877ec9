//! Client app version parsing and ordering

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

/// Error for version strings that do not have the `X.Y.Z(.tag)?` form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseVersionError {
    #[error("expected at least three dot-separated components in {0:?}")]
    MissingComponents(String),

    #[error("non-numeric component {component:?} in {input:?}")]
    NonNumericComponent { input: String, component: String },
}

/// A client app version of the form `X.Y.Z`, optionally followed by an
/// alphanumeric tag (`2.2.1.debug`).
///
/// Ordering, equality and hashing consider only the numeric
/// (major, minor, patch) triple. The tag is preserved so the original
/// string round-trips through [`fmt::Display`], but it is never compared:
/// `2.2.1.debug` and `2.2.1` are the same version.
#[derive(Debug, Clone)]
pub struct AppVersion {
    major: u32,
    minor: u32,
    patch: u32,
    suffix: Option<String>,
}

impl AppVersion {
    /// A tag-less version from its numeric components.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            suffix: None,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// The trailing tag, if the parsed string carried one.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl FromStr for AppVersion {
    type Err = ParseVersionError;

    /// Parse `X.Y.Z(.tag)?`.
    ///
    /// The first three dot-separated tokens must be base-10 non-negative
    /// integers; everything after the third dot is kept as the tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.splitn(4, '.').collect();
        if tokens.len() < 3 {
            return Err(ParseVersionError::MissingComponents(s.to_string()));
        }

        let parse_component = |token: &str| {
            token
                .parse::<u32>()
                .map_err(|_| ParseVersionError::NonNumericComponent {
                    input: s.to_string(),
                    component: token.to_string(),
                })
        };

        Ok(Self {
            major: parse_component(tokens[0])?,
            minor: parse_component(tokens[1])?,
            patch: parse_component(tokens[2])?,
            suffix: tokens.get(3).map(|tag| (*tag).to_string()),
        })
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            Some(tag) => write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, tag),
            None => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

impl PartialEq for AppVersion {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for AppVersion {}

impl PartialOrd for AppVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AppVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl Hash for AppVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", 1, 2, 3, None)]
    #[case("0.0.0", 0, 0, 0, None)]
    #[case("10.20.30", 10, 20, 30, None)]
    #[case("2.2.1.debug", 2, 2, 1, Some("debug"))]
    #[case("2.2.1.X", 2, 2, 1, Some("X"))]
    #[case("1.0.0.rc1", 1, 0, 0, Some("rc1"))]
    fn parse_extracts_components(
        #[case] input: &str,
        #[case] major: u32,
        #[case] minor: u32,
        #[case] patch: u32,
        #[case] suffix: Option<&str>,
    ) {
        let version: AppVersion = input.parse().unwrap();

        assert_eq!(version.major(), major);
        assert_eq!(version.minor(), minor);
        assert_eq!(version.patch(), patch);
        assert_eq!(version.suffix(), suffix);
    }

    #[rstest]
    #[case("1.2.3")]
    #[case("2.2.1.debug")]
    #[case("1.0.0.rc1")]
    fn display_round_trips_input(#[case] input: &str) {
        let version: AppVersion = input.parse().unwrap();
        assert_eq!(version.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("1")]
    #[case("1.2")]
    #[case("a.b.c")]
    #[case("1.2.x")]
    #[case("1.x.3")]
    #[case("x.2.3")]
    #[case("-1.2.3")]
    fn parse_rejects_malformed_strings(#[case] input: &str) {
        assert!(input.parse::<AppVersion>().is_err());
    }

    #[test]
    fn parse_reports_missing_components() {
        let err = "1.2".parse::<AppVersion>().unwrap_err();
        assert_eq!(err, ParseVersionError::MissingComponents("1.2".to_string()));
    }

    #[test]
    fn parse_reports_the_offending_component() {
        let err = "1.beta.3".parse::<AppVersion>().unwrap_err();
        assert_eq!(
            err,
            ParseVersionError::NonNumericComponent {
                input: "1.beta.3".to_string(),
                component: "beta".to_string(),
            }
        );
    }

    #[rstest]
    #[case("1.2.3", "1.2.4", Ordering::Less)]
    #[case("1.2.3", "1.3.0", Ordering::Less)]
    #[case("1.2.3", "2.0.0", Ordering::Less)]
    #[case("2.0.0", "1.9.9", Ordering::Greater)]
    #[case("1.10.0", "1.9.0", Ordering::Greater)]
    #[case("1.2.3", "1.2.3", Ordering::Equal)]
    fn ordering_is_numeric_over_the_triple(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        let left: AppVersion = left.parse().unwrap();
        let right: AppVersion = right.parse().unwrap();
        assert_eq!(left.cmp(&right), expected);
    }

    #[test]
    fn suffix_is_ignored_for_comparison() {
        let tagged: AppVersion = "1.2.3.abc".parse().unwrap();
        let plain: AppVersion = "1.2.3".parse().unwrap();

        assert_eq!(tagged, plain);
        assert_eq!(tagged.cmp(&plain), Ordering::Equal);
        assert!("1.2.3.zzz".parse::<AppVersion>().unwrap() < "1.2.4".parse().unwrap());
    }

    #[test]
    fn hashing_is_consistent_with_equality() {
        let mut versions = std::collections::HashSet::new();
        versions.insert("1.2.3.abc".parse::<AppVersion>().unwrap());

        assert!(versions.contains(&"1.2.3".parse::<AppVersion>().unwrap()));
    }
}
