use crate::error::{GoopsError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static EMBEDDED_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+\.\d+)").expect("valid version regex"));

/// Suffix marking a version that has not been released yet
pub const SNAPSHOT: &str = "SNAPSHOT";

/// Semantic version as it appears in tags and branch names.
///
/// Only the first three dot-separated components are interpreted. The third may
/// carry a free-form identifier after a `-` (`"12-SNAPSHOT"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    raw: String,
}

impl SemanticVersion {
    /// Create a new version without a prerelease identifier
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self::with_prerelease(major, minor, patch, None)
    }

    fn with_prerelease(major: u64, minor: u64, patch: u64, prerelease: Option<String>) -> Self {
        let prerelease = prerelease.filter(|id| !id.is_empty());
        let raw = render(major, minor, patch, prerelease.as_deref());
        SemanticVersion {
            major,
            minor,
            patch,
            prerelease,
            raw,
        }
    }

    /// Parse a version string such as `"1.2.3"` or `"3.909.1220-SNAPSHOT"`
    pub fn parse(version: &str) -> Result<Self> {
        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() < 3 {
            return Err(GoopsError::parse(format!(
                "'{}' - expected MAJOR.MINOR.PATCH",
                version
            )));
        }

        let major = parse_component(version, "major", parts[0])?;
        let minor = parse_component(version, "minor", parts[1])?;

        let (patch_digits, identifier) = match parts[2].split_once('-') {
            Some((digits, identifier)) => (digits, Some(identifier.to_string())),
            None => (parts[2], None),
        };
        let patch = parse_component(version, "patch", patch_digits)?;

        let mut parsed = Self::with_prerelease(major, minor, patch, identifier);
        parsed.raw = version.to_string();
        Ok(parsed)
    }

    /// The string this version was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Next minor version: minor + 1, patch reset, identifier kept
    pub fn bump_minor(&self) -> Result<Self> {
        let minor = self.increment("minor", self.minor)?;
        Ok(Self::with_prerelease(self.major, minor, 0, self.prerelease.clone()))
    }

    /// Next patch version: patch + 1, identifier kept
    pub fn bump_patch(&self) -> Result<Self> {
        let patch = self.increment("patch", self.patch)?;
        Ok(Self::with_prerelease(self.major, self.minor, patch, self.prerelease.clone()))
    }

    fn increment(&self, name: &str, component: u64) -> Result<u64> {
        component.checked_add(1).ok_or_else(|| {
            GoopsError::parse(format!(
                "'{}' - {} component cannot be incremented",
                self.raw, name
            ))
        })
    }

    /// Same numbers with the given prerelease identifier
    pub fn with_identifier(&self, identifier: &str) -> Self {
        Self::with_prerelease(
            self.major,
            self.minor,
            self.patch,
            Some(identifier.to_string()),
        )
    }

    pub fn is_snapshot(&self) -> bool {
        self.prerelease.as_deref() == Some(SNAPSHOT)
    }
}

fn parse_component(version: &str, name: &str, component: &str) -> Result<u64> {
    component.parse::<u64>().map_err(|_| {
        GoopsError::parse(format!(
            "'{}' - {} component '{}' is not a number",
            version, name, component
        ))
    })
}

fn render(major: u64, minor: u64, patch: u64, prerelease: Option<&str>) -> String {
    match prerelease {
        Some(id) => format!("{}.{}.{}-{}", major, minor, patch, id),
        None => format!("{}.{}.{}", major, minor, patch),
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(
            self.major,
            self.minor,
            self.patch,
            self.prerelease.as_deref(),
        ))
    }
}

impl FromStr for SemanticVersion {
    type Err = GoopsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// First `MAJOR.MINOR.PATCH` embedded anywhere in a text
pub fn find_version(text: &str) -> Option<&str> {
    EMBEDDED_VERSION
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Bump the minor component of a version string
pub fn bump_minor(version: &str) -> Result<String> {
    Ok(SemanticVersion::parse(version)?.bump_minor()?.to_string())
}

/// Bump the patch component of a version string
pub fn bump_patch(version: &str) -> Result<String> {
    Ok(SemanticVersion::parse(version)?.bump_patch()?.to_string())
}
