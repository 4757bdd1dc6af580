//! Version Validator - numeric version ordering and patch bumps
//!
//! Published versions are ordered by comparing their dot-separated components
//! as integers, so `2.0.10` sorts above `2.0.9`. Anything that does not parse
//! that way is reported back to the caller instead of being silently dropped.
//!
//! # Example
//!
//! ```
//! use plugin_publisher::validation::version_validator::VersionValidator;
//!
//! let validator = VersionValidator::new();
//! let selection = validator.select_max(["2.0.3", "2.0.10", "2.0.9"]);
//!
//! assert_eq!(selection.max.as_deref(), Some("2.0.10"));
//! assert_eq!(validator.next_version("2.0.10").as_deref(), Some("2.0.11"));
//! ```

use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A version whose components are all non-negative integers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericVersion {
    raw: String,
    components: Vec<u64>,
}

impl NumericVersion {
    /// Parse a dot-separated numeric version; `None` if any component is not an integer
    pub fn parse(raw: &str) -> Option<Self> {
        let components = raw
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            raw: raw.to_string(),
            components,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }
}

impl Ord for NumericVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl PartialOrd for NumericVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Maximum of a version history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaxSelection {
    /// Highest numeric version, if any entry was numeric
    pub max: Option<String>,
    /// Entries that were skipped because they are not numeric
    pub ignored: Vec<String>,
}

/// Result of checking an explicit version against semver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionValidationResult {
    /// Whether the version is valid semver
    pub is_valid: bool,
    /// Parser message when it is not
    pub error: Option<String>,
    /// Whether the version carries a pre-release tag
    pub is_prerelease: bool,
}

/// Version ordering and validation
#[derive(Debug, Default)]
pub struct VersionValidator;

impl VersionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check a version string against semver
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_publisher::validation::version_validator::VersionValidator;
    ///
    /// let validator = VersionValidator::new();
    ///
    /// assert!(validator.validate("1.2.3").is_valid);
    /// assert!(!validator.validate("5").is_valid);
    /// ```
    pub fn validate(&self, version_str: &str) -> VersionValidationResult {
        match Version::parse(version_str) {
            Ok(version) => VersionValidationResult {
                is_valid: true,
                error: None,
                is_prerelease: !version.pre.is_empty(),
            },
            Err(e) => VersionValidationResult {
                is_valid: false,
                error: Some(e.to_string()),
                is_prerelease: false,
            },
        }
    }

    /// Compare two versions numerically
    ///
    /// Returns `None` if either version has a non-numeric component.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_publisher::validation::version_validator::VersionValidator;
    /// use std::cmp::Ordering;
    ///
    /// let validator = VersionValidator::new();
    ///
    /// assert_eq!(validator.compare("2.0.10", "2.0.9"), Some(Ordering::Greater));
    /// assert_eq!(validator.compare("1.0.0-beta", "1.0.0"), None);
    /// ```
    pub fn compare(&self, v1: &str, v2: &str) -> Option<Ordering> {
        let version1 = NumericVersion::parse(v1)?;
        let version2 = NumericVersion::parse(v2)?;
        Some(version1.cmp(&version2))
    }

    /// Select the highest numeric version of a history
    pub fn select_max<I, S>(&self, history: I) -> MaxSelection
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = MaxSelection::default();
        let mut best: Option<NumericVersion> = None;

        for raw in history {
            let raw = raw.as_ref();
            match NumericVersion::parse(raw) {
                Some(version) => {
                    if best.as_ref().is_none_or(|b| version > *b) {
                        best = Some(version);
                    }
                }
                None => selection.ignored.push(raw.to_string()),
            }
        }

        selection.max = best.map(|v| v.raw);
        selection
    }

    /// Version following `max`
    ///
    /// With three or more components the third is incremented and anything
    /// after it dropped; shorter versions get `.1` appended. `None` when
    /// `max` is not numeric or its patch component cannot be incremented.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_publisher::validation::version_validator::VersionValidator;
    ///
    /// let validator = VersionValidator::new();
    ///
    /// assert_eq!(validator.next_version("2.0.3").as_deref(), Some("2.0.4"));
    /// assert_eq!(validator.next_version("5").as_deref(), Some("5.1"));
    /// ```
    pub fn next_version(&self, max: &str) -> Option<String> {
        let version = NumericVersion::parse(max)?;
        match version.components() {
            [major, minor, patch, ..] => {
                let patch = patch.checked_add(1)?;
                Some(format!("{}.{}.{}", major, minor, patch))
            }
            _ => Some(format!("{}.1", max)),
        }
    }
}
