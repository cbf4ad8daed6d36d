use crate::domain::version::find_version;
use crate::error::{GoopsError, Result};
use regex::Regex;
use std::sync::LazyLock;

static STABLE_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)-stable$").expect("valid stable branch regex"));
static MAJOR_MINOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+)").expect("valid major.minor regex"));
static HOTFIX_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"hotfix.*$").expect("valid hotfix regex"));
static RELEASE_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^release.*$").expect("valid release regex"));

/// Branch name git reports for a detached checkout
pub const DETACHED_HEAD: &str = "HEAD";

/// Branch the build runs on, classified against the known branch shapes.
///
/// CI systems that check out a detached commit report `HEAD` as the branch, so the
/// ref name handed over by CI is consulted too. It replaces a detached `HEAD` for
/// every branch shape, and otherwise wins when it names a stable branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName {
    pub raw: String,
    pub is_stable: bool,
    pub release_version_fragment: Option<String>,
    effective: String,
}

impl BranchName {
    pub fn new(raw: impl Into<String>, ci_ref_name: Option<&str>) -> Self {
        let raw = raw.into();
        let ci_ref_name = ci_ref_name.filter(|name| !name.is_empty());

        let effective = match ci_ref_name {
            Some(ref_name) if raw == DETACHED_HEAD => ref_name.to_string(),
            Some(ref_name) if !is_stable_name(&raw) && is_stable_name(ref_name) => {
                ref_name.to_string()
            }
            _ => raw.clone(),
        };
        let is_stable = is_stable_branch(&raw, ci_ref_name);
        let release_version_fragment = if is_stable || is_release_or_hotfix_branch(&effective) {
            version_from_branch_name(&effective).ok()
        } else {
            None
        };

        BranchName {
            raw,
            is_stable,
            release_version_fragment,
            effective,
        }
    }

    /// Name used for version extraction
    pub fn effective(&self) -> &str {
        &self.effective
    }

    pub fn is_master(&self) -> bool {
        self.effective == "master"
    }

    pub fn is_release_or_hotfix(&self) -> bool {
        is_release_or_hotfix_branch(&self.effective)
    }
}

fn is_stable_name(branch: &str) -> bool {
    STABLE_BRANCH.is_match(branch)
}

/// True when the branch, or the CI provided ref name, looks like `X.Y-stable`
pub fn is_stable_branch(branch: &str, ci_ref_name: Option<&str>) -> bool {
    is_stable_name(branch) || ci_ref_name.is_some_and(is_stable_name)
}

/// True for `release*` branches and any branch containing `hotfix`
pub fn is_release_or_hotfix_branch(branch: &str) -> bool {
    HOTFIX_BRANCH.is_match(branch) || RELEASE_BRANCH.is_match(branch)
}

/// Version carried by a branch name.
///
/// `2.11-stable` yields `2.11.0`; any other branch yields the first
/// `MAJOR.MINOR.PATCH` found in it (`hotfix-3.2.311` yields `3.2.311`).
pub fn version_from_branch_name(branch: &str) -> Result<String> {
    if let Some(captures) = STABLE_BRANCH.captures(branch) {
        return Ok(format!("{}.0", &captures[1]));
    }

    find_version(branch)
        .map(str::to_string)
        .ok_or_else(|| {
            GoopsError::pattern_not_found(format!("version not found in branch name: {}", branch))
        })
}

/// True when `version` belongs to the `MAJOR.MINOR` line named by `branch`
pub fn version_matches_branch(version: &str, branch: &str) -> Result<bool> {
    let branch_line = major_minor(branch, "branch name")?;
    let version_line = major_minor(version, "version")?;
    Ok(branch_line == version_line)
}

fn major_minor<'a>(s: &'a str, what: &str) -> Result<&'a str> {
    MAJOR_MINOR
        .captures(s)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            GoopsError::pattern_not_found(format!("version not found in {}: {}", what, s))
        })
}
