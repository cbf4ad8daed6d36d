use crate::boundary::BoundaryWarning;
use crate::domain::{SemanticVersion, SNAPSHOT};
use crate::error::Result;
use crate::git::RepositoryFacts;
use crate::release::ReleaseStrategy;
use tracing::info;

/// Inputs of a resolution, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub strategy: ReleaseStrategy,
    /// Ref name reported by CI, consulted when the checkout is detached
    pub ci_ref_name: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            strategy: ReleaseStrategy::GithubFlow,
            ci_ref_name: None,
        }
    }
}

/// Version of the current checkout in both its snapshot and release forms
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVersion {
    pub snapshot: String,
    pub release: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub warnings: Vec<BoundaryWarning>,
}

impl ResolvedVersion {
    fn from_snapshot(snapshot: String, warnings: Vec<BoundaryWarning>) -> Result<Self> {
        let release = strip_snapshot(&snapshot);
        let parsed = SemanticVersion::parse(&release)?;

        Ok(ResolvedVersion {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            snapshot,
            release,
            warnings,
        })
    }

    /// Unprefixed variable names and values describing this version
    pub fn exports(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SEMVER", self.snapshot.clone()),
            ("SEMVER_RELEASE", self.release.clone()),
            ("SEMVER_MAJOR", self.major.to_string()),
            ("SEMVER_MINOR", self.minor.to_string()),
            ("SEMVER_PATCH", self.patch.to_string()),
        ]
    }
}

/// Remove the first `-SNAPSHOT` from a version string
pub fn strip_snapshot(version: &str) -> String {
    version.replacen(&format!("-{}", SNAPSHOT), "", 1)
}

/// Resolves the version of a checkout with the configured strategy
#[derive(Debug, Clone)]
pub struct VersionResolver {
    config: ResolverConfig,
}

impl VersionResolver {
    pub fn new(config: ResolverConfig) -> Self {
        VersionResolver { config }
    }

    /// Build a resolver from a strategy name as found in configuration
    pub fn from_names(strategy: &str, ci_ref_name: Option<&str>) -> Result<Self> {
        Ok(VersionResolver::new(ResolverConfig {
            strategy: strategy.parse()?,
            ci_ref_name: ci_ref_name.map(str::to_string),
        }))
    }

    pub fn strategy(&self) -> ReleaseStrategy {
        self.config.strategy
    }

    pub fn resolve<R: RepositoryFacts + ?Sized>(&self, facts: &R) -> Result<ResolvedVersion> {
        let mut warnings = Vec::new();
        let snapshot = self.config.strategy.next_version(
            facts,
            self.config.ci_ref_name.as_deref(),
            &mut warnings,
        )?;
        info!(strategy = %self.config.strategy, version = %snapshot, "resolved version");

        ResolvedVersion::from_snapshot(snapshot, warnings)
    }
}
