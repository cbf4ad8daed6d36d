use crate::boundary::BoundaryWarning;
use crate::domain::branch::{version_from_branch_name, version_matches_branch};
use crate::domain::{BranchName, SemanticVersion, SNAPSHOT};
use crate::error::{GoopsError, Result};
use crate::git::{RepositoryFacts, INITIAL_VERSION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Release flow used to derive the next version from repository facts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStrategy {
    /// Every change lands on master; the next version is the next minor
    GithubFlow,
    /// Master plus `X.Y-stable` maintenance branches
    GitlabFlow,
    /// git-flow with `release-*` / `hotfix-*` branches merged into master
    GitFlowBranch,
}

impl ReleaseStrategy {
    pub const ALL: [ReleaseStrategy; 3] = [
        ReleaseStrategy::GithubFlow,
        ReleaseStrategy::GitlabFlow,
        ReleaseStrategy::GitFlowBranch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReleaseStrategy::GithubFlow => "github-flow",
            ReleaseStrategy::GitlabFlow => "gitlab-flow",
            ReleaseStrategy::GitFlowBranch => "git-flow-branch",
        }
    }

    /// Compute the version of the current checkout.
    ///
    /// A tag on HEAD is returned verbatim. Otherwise the strategy derives a base
    /// version and marks it `-SNAPSHOT`, except on master under git-flow where the
    /// last merged release is reported as is.
    pub fn next_version<R: RepositoryFacts + ?Sized>(
        &self,
        facts: &R,
        ci_ref_name: Option<&str>,
        warnings: &mut Vec<BoundaryWarning>,
    ) -> Result<String> {
        if let Some(tag) = head_tag(facts, warnings) {
            debug!(tag = %tag, "HEAD is tagged");
            return Ok(tag);
        }

        let version = match self {
            ReleaseStrategy::GithubFlow => {
                let previous = previous_tag_or_initial(facts, warnings);
                SemanticVersion::parse(&previous)?.bump_minor()?.to_string()
            }
            ReleaseStrategy::GitlabFlow => gitlab_flow(facts, ci_ref_name, warnings)?,
            ReleaseStrategy::GitFlowBranch => {
                let merged = facts.previously_merged_version()?;
                let branch = BranchName::new(facts.current_branch()?, ci_ref_name);
                if branch.is_master() {
                    return Ok(merged);
                }
                git_flow_branch(facts, &branch, &merged)?
            }
        };

        Ok(format!("{}-{}", version, SNAPSHOT))
    }
}

fn gitlab_flow<R: RepositoryFacts + ?Sized>(
    facts: &R,
    ci_ref_name: Option<&str>,
    warnings: &mut Vec<BoundaryWarning>,
) -> Result<String> {
    let previous = previous_tag_or_initial(facts, warnings);
    let branch = BranchName::new(facts.current_branch()?, ci_ref_name);

    if branch.is_stable {
        if version_matches_branch(&previous, branch.effective())? {
            return Ok(SemanticVersion::parse(&previous)?.bump_patch()?.to_string());
        }
        return version_from_branch_name(branch.effective());
    }

    let candidate = SemanticVersion::parse(&previous)?.bump_minor()?;
    if facts.stable_branch_exists(candidate.major, candidate.minor)? {
        debug!(candidate = %candidate, "stable branch already cut, skipping minor");
        return Ok(candidate.bump_minor()?.to_string());
    }
    Ok(candidate.to_string())
}

fn git_flow_branch<R: RepositoryFacts + ?Sized>(
    facts: &R,
    branch: &BranchName,
    merged: &str,
) -> Result<String> {
    if branch.is_release_or_hotfix() {
        return version_from_branch_name(branch.effective());
    }

    let candidate = SemanticVersion::parse(merged)?.bump_minor()?;
    if facts.branch_exists(&candidate.to_string())? {
        debug!(candidate = %candidate, "branch for candidate exists, skipping minor");
        return Ok(candidate.bump_minor()?.to_string());
    }
    Ok(candidate.to_string())
}

fn head_tag<R: RepositoryFacts + ?Sized>(
    facts: &R,
    warnings: &mut Vec<BoundaryWarning>,
) -> Option<String> {
    tag_or_warn(facts.head_tag(), "HEAD tag", warnings)
}

fn previous_tag_or_initial<R: RepositoryFacts + ?Sized>(
    facts: &R,
    warnings: &mut Vec<BoundaryWarning>,
) -> String {
    tag_or_warn(facts.previous_tag(), "previous tag", warnings).unwrap_or_else(|| {
        warnings.push(BoundaryWarning::NoPreviousTag {
            assumed: INITIAL_VERSION.to_string(),
        });
        INITIAL_VERSION.to_string()
    })
}

fn tag_or_warn(
    lookup: Result<Option<String>>,
    query: &str,
    warnings: &mut Vec<BoundaryWarning>,
) -> Option<String> {
    match lookup {
        Ok(tag) => tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        Err(e) => {
            warn!(query, error = %e, "tag lookup failed");
            warnings.push(BoundaryWarning::TagLookupFailed {
                query: query.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

impl fmt::Display for ReleaseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReleaseStrategy {
    type Err = GoopsError;

    fn from_str(s: &str) -> Result<Self> {
        ReleaseStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = ReleaseStrategy::ALL.iter().map(|s| s.name()).collect();
                GoopsError::config(format!(
                    "unexpected strategy: '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}
