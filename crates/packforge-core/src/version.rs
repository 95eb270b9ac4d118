//! Package versions and version ranges.
//!
//! Package versions accept one to four numeric components with optional
//! prerelease and build metadata (`1.0`, `1.0.0`, `1.0.0.5`, `2.1.0-beta.1+abc`).
//! Ranges use interval notation:
//!
//! ```text
//! 1.0.0          1.0.0 or later
//! [1.0.0]        exactly 1.0.0
//! [1.0.0, 2.0.0) 1.0.0 or later, below 2.0.0
//! (, 2.0.0]      up to and including 2.0.0
//! *              any version
//! ```

use crate::PackError;
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A package version.
///
/// Equality and ordering ignore build metadata.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    version: Version,
    revision: u64,
}

impl PackageVersion {
    /// Create a release version from its three main components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            version: Version::new(major, minor, patch),
            revision: 0,
        }
    }

    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidVersion`] if the string is not a valid version.
    pub fn parse(value: &str) -> Result<Self, PackError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PackError::invalid_version(value, "version cannot be empty"));
        }

        let (rest, build) = match trimmed.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (trimmed, None),
        };
        let (numbers, pre) = match rest.split_once('-') {
            Some((numbers, pre)) => (numbers, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() > 4 {
            return Err(PackError::invalid_version(
                value,
                "expected at most four numeric components",
            ));
        }

        let mut components = [0u64; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PackError::invalid_version(
                    value,
                    format!("'{part}' is not a numeric version component"),
                ));
            }
            *slot = part
                .parse()
                .map_err(|e| PackError::invalid_version(value, e))?;
        }

        let mut version = Version::new(components[0], components[1], components[2]);

        if let Some(pre) = pre {
            if pre.is_empty() {
                return Err(PackError::invalid_version(value, "empty prerelease label"));
            }
            version.pre = Prerelease::new(pre).map_err(|e| PackError::invalid_version(value, e))?;
        }

        if let Some(build) = build {
            if build.is_empty() {
                return Err(PackError::invalid_version(value, "empty build metadata"));
            }
            version.build =
                BuildMetadata::new(build).map_err(|e| PackError::invalid_version(value, e))?;
        }

        Ok(Self {
            version,
            revision: components[3],
        })
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.version.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    #[must_use]
    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// The optional fourth component (0 when absent).
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    /// The prerelease label without the leading `-`, empty for releases.
    #[must_use]
    pub fn release_label(&self) -> &str {
        self.version.pre.as_str()
    }

    fn key(&self) -> (u64, u64, u64, u64) {
        (
            self.version.major,
            self.version.minor,
            self.version.patch,
            self.revision,
        )
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.version;
        write!(f, "{}.{}.{}", v.major, v.minor, v.patch)?;
        if self.revision > 0 {
            write!(f, ".{}", self.revision)?;
        }
        if !v.pre.is_empty() {
            write!(f, "-{}", v.pre)?;
        }
        if !v.build.is_empty() {
            write!(f, "+{}", v.build)?;
        }
        Ok(())
    }
}

impl FromStr for PackageVersion {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key()
            .cmp(&other.key())
            .then_with(|| self.version.pre.cmp(&other.version.pre))
    }
}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
        self.version.pre.as_str().hash(state);
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A range of acceptable package versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionRange {
    min: Option<PackageVersion>,
    min_inclusive: bool,
    max: Option<PackageVersion>,
    max_inclusive: bool,
}

impl VersionRange {
    /// Any version.
    #[must_use]
    pub fn all() -> Self {
        Self {
            min: None,
            min_inclusive: false,
            max: None,
            max_inclusive: false,
        }
    }

    /// `version` or later.
    #[must_use]
    pub fn at_least(version: PackageVersion) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
        }
    }

    /// Exactly `version`.
    #[must_use]
    pub fn exact(version: PackageVersion) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
        }
    }

    /// Parse a version range.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidVersion`] for malformed ranges or bounds.
    pub fn parse(value: &str) -> Result<Self, PackError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PackError::invalid_version(
                value,
                "version range cannot be empty",
            ));
        }
        if trimmed == "*" {
            return Ok(Self::all());
        }
        if !trimmed.starts_with(['[', '(']) {
            return PackageVersion::parse(trimmed).map(Self::at_least);
        }

        let min_inclusive = trimmed.starts_with('[');
        let max_inclusive = if trimmed.ends_with(']') {
            true
        } else if trimmed.ends_with(')') {
            false
        } else {
            return Err(PackError::invalid_version(
                value,
                "range is missing its closing bracket",
            ));
        };
        if trimmed.len() < 2 {
            return Err(PackError::invalid_version(value, "range is empty"));
        }
        let inner = &trimmed[1..trimmed.len() - 1];

        let Some((lower, upper)) = inner.split_once(',') else {
            if !(min_inclusive && max_inclusive) {
                return Err(PackError::invalid_version(
                    value,
                    "an exact version must be written as [version]",
                ));
            }
            return match parse_bound(inner)? {
                Some(version) => Ok(Self::exact(version)),
                None => Err(PackError::invalid_version(value, "range is empty")),
            };
        };

        if upper.contains(',') {
            return Err(PackError::invalid_version(
                value,
                "range has more than two bounds",
            ));
        }

        let min = parse_bound(lower)?;
        let max = parse_bound(upper)?;

        match (&min, &max) {
            (None, None) => {
                return Err(PackError::invalid_version(
                    value,
                    "range needs at least one bound",
                ));
            }
            (Some(lo), Some(hi)) => match lo.cmp(hi) {
                Ordering::Greater => {
                    return Err(PackError::invalid_version(
                        value,
                        "minimum version is above maximum version",
                    ));
                }
                Ordering::Equal if !(min_inclusive && max_inclusive) => {
                    return Err(PackError::invalid_version(value, "range is empty"));
                }
                _ => {}
            },
            _ => {}
        }

        Ok(Self {
            min_inclusive: min.is_some() && min_inclusive,
            max_inclusive: max.is_some() && max_inclusive,
            min,
            max,
        })
    }

    #[must_use]
    pub fn min(&self) -> Option<&PackageVersion> {
        self.min.as_ref()
    }

    #[must_use]
    pub fn max(&self) -> Option<&PackageVersion> {
        self.max.as_ref()
    }

    #[must_use]
    pub fn is_min_inclusive(&self) -> bool {
        self.min_inclusive
    }

    #[must_use]
    pub fn is_max_inclusive(&self) -> bool {
        self.max_inclusive
    }

    /// Check whether `version` falls inside this range.
    #[must_use]
    pub fn satisfies(&self, version: &PackageVersion) -> bool {
        let above_min = match &self.min {
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
            None => true,
        };
        let below_max = match &self.max {
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
            None => true,
        };
        above_min && below_max
    }
}

fn parse_bound(text: &str) -> Result<Option<PackageVersion>, PackError> {
    let text = text.trim();
    if text.is_empty() {
        Ok(None)
    } else {
        PackageVersion::parse(text).map(Some)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (None, None) => f.write_str("*"),
            (Some(min), None) if self.min_inclusive => write!(f, "{min}"),
            (Some(min), Some(max)) if self.min_inclusive && self.max_inclusive && min == max => {
                write!(f, "[{min}]")
            }
            _ => {
                f.write_str(if self.min_inclusive { "[" } else { "(" })?;
                if let Some(min) = &self.min {
                    write!(f, "{min}")?;
                }
                f.write_str(", ")?;
                if let Some(max) = &self.max {
                    write!(f, "{max}")?;
                }
                f.write_str(if self.max_inclusive { "]" } else { ")" })
            }
        }
    }
}

impl FromStr for VersionRange {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    #[test]
    fn version_round_trip() {
        assert_eq!(v("1.0.0").to_string(), "1.0.0");
        assert_eq!(v("2.1.0-beta.1+sha.5").to_string(), "2.1.0-beta.1+sha.5");
    }

    #[test]
    fn short_versions_are_padded() {
        assert_eq!(v("1").to_string(), "1.0.0");
        assert_eq!(v("1.2").to_string(), "1.2.0");
    }

    #[test]
    fn revision_prints_only_when_set() {
        assert_eq!(v("1.2.3.4").to_string(), "1.2.3.4");
        assert_eq!(v("1.2.3.0").to_string(), "1.2.3");
        assert_eq!(v("1.2.3.4").revision(), 4);
    }

    #[test]
    fn invalid_versions_are_rejected() {
        for input in ["not-a-version", "", "1.2.3.4.5", "1..2", "1.0.0-", "v1.0"] {
            let err = PackageVersion::parse(input).unwrap_err();
            assert!(
                matches!(err, PackError::InvalidVersion { .. }),
                "{input} should be invalid"
            );
        }
    }

    #[test]
    fn invalid_version_keeps_original_value() {
        match PackageVersion::parse("not-a-version").unwrap_err() {
            PackError::InvalidVersion { value, .. } => assert_eq!(value, "not-a-version"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ordering() {
        assert!(v("1.0.0-beta") < v("1.0.0"));
        assert!(v("1.0.0") < v("1.0.0.1"));
        assert!(v("1.0.0.1") < v("1.0.1"));
        assert!(v("1.0.0-alpha") < v("1.0.0-beta"));
        assert_eq!(v("1.0.0+one"), v("1.0.0+two"));
        assert_eq!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn bare_range_means_at_least() {
        let range = VersionRange::parse("1.0.0").unwrap();
        assert!(range.satisfies(&v("1.0.0")));
        assert!(range.satisfies(&v("7.0.0")));
        assert!(!range.satisfies(&v("0.9.0")));
        assert_eq!(range.to_string(), "1.0.0");
    }

    #[test]
    fn interval_ranges() {
        let range = VersionRange::parse("[1.0, 2.0)").unwrap();
        assert!(range.satisfies(&v("1.0.0")));
        assert!(range.satisfies(&v("1.9.9")));
        assert!(!range.satisfies(&v("2.0.0")));
        assert_eq!(range.to_string(), "[1.0.0, 2.0.0)");

        let upper_only = VersionRange::parse("(, 3.0]").unwrap();
        assert!(upper_only.satisfies(&v("0.0.1")));
        assert!(upper_only.satisfies(&v("3.0.0")));
        assert!(!upper_only.satisfies(&v("3.0.1")));
        assert_eq!(upper_only.to_string(), "(, 3.0.0]");

        let exclusive_min = VersionRange::parse("(1.0,)").unwrap();
        assert!(!exclusive_min.satisfies(&v("1.0.0")));
        assert_eq!(exclusive_min.to_string(), "(1.0.0, )");
    }

    #[test]
    fn exact_range() {
        let range = VersionRange::parse("[1.2.3]").unwrap();
        assert_eq!(range, VersionRange::exact(v("1.2.3")));
        assert!(!range.satisfies(&v("1.2.4")));
        assert_eq!(range.to_string(), "[1.2.3]");
    }

    #[test]
    fn star_is_all() {
        let range = VersionRange::parse("*").unwrap();
        assert_eq!(range, VersionRange::all());
        assert!(range.satisfies(&v("0.0.1")));
        assert_eq!(range.to_string(), "*");
    }

    #[test]
    fn display_reparses_to_same_range() {
        for input in ["1.0.0", "[1.0.0]", "[1.0.0, 2.0.0)", "(, 3.0.0]", "(1.0.0, )", "*"] {
            let range = VersionRange::parse(input).unwrap();
            assert_eq!(VersionRange::parse(&range.to_string()).unwrap(), range);
        }
    }

    #[test]
    fn invalid_ranges() {
        for input in ["", "[1.0", "(1.0)", "[2.0, 1.0]", "(1.0, 1.0)", "[,]", "[1.0, 2.0, 3.0]", "[x, 2.0]"] {
            assert!(
                VersionRange::parse(input).is_err(),
                "{input:?} should be invalid"
            );
        }
    }
}
