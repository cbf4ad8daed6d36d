//! Read-only git facts consumed by version resolution and issue lookup
//!
//! The [RepositoryFacts] trait is the only way the rest of goops talks to git.
//! The concrete implementations are:
//!
//! - [repository::Git2Repository]: a real repository opened with the `git2` crate
//! - [mock::MockRepository]: canned facts for tests
//!
//! ```rust
//! # use goops::git::RepositoryFacts;
//! # fn example<R: RepositoryFacts>(repo: &R) -> goops::Result<()> {
//! let branch = repo.current_branch()?;
//! let previous = repo.previous_tag()?.unwrap_or_else(|| "0.0.0".to_string());
//! println!("{} on {}", previous, branch);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::version::find_version;
use crate::error::{GoopsError, Result};

/// Tag that is moved on every nightly build and never names a release
pub const NIGHTLY_TAG: &str = "nightly";

/// Version reported when no merge commit exists
pub const INITIAL_VERSION: &str = "0.0.0";

/// Read-only repository queries.
///
/// Tag lookups return `Ok(None)` when there is no tag. Callers treat an `Err` from a
/// tag lookup as "no tag"; errors from the other queries are fatal.
pub trait RepositoryFacts {
    /// Tag pointing exactly at HEAD, ignoring [NIGHTLY_TAG]
    fn head_tag(&self) -> Result<Option<String>>;

    /// Closest tag reachable from HEAD, ignoring [NIGHTLY_TAG]
    fn previous_tag(&self) -> Result<Option<String>>;

    /// Short name of the checked out branch (`HEAD` when detached)
    fn current_branch(&self) -> Result<String>;

    /// Remote-tracking branch names, e.g. `origin/2.1-stable`
    fn remote_branches(&self) -> Result<Vec<String>>;

    /// Message of the HEAD commit
    fn last_commit_message(&self) -> Result<String>;

    /// Message of the most recent merge commit reachable from HEAD
    fn last_merge_message(&self) -> Result<Option<String>>;

    /// True when a remote branch `*{major}.{minor}-stable` exists.
    ///
    /// `{major}` must start the version line, so `14.5-stable` is not a match for 4.5.
    fn stable_branch_exists(&self, major: u64, minor: u64) -> Result<bool> {
        let suffix = format!("{}.{}-stable", major, minor);
        Ok(self.remote_branches()?.iter().any(|branch| {
            branch
                .strip_suffix(&suffix)
                .map(|head| !head.ends_with(|c: char| c.is_ascii_digit() || c == '.'))
                .unwrap_or(false)
        }))
    }

    /// True when a remote branch name contains `fragment`
    fn branch_exists(&self, fragment: &str) -> Result<bool> {
        Ok(self
            .remote_branches()?
            .iter()
            .any(|branch| branch.contains(fragment)))
    }

    /// Version named in the last merge commit, [INITIAL_VERSION] without merges
    fn previously_merged_version(&self) -> Result<String> {
        match self.last_merge_message()? {
            None => Ok(INITIAL_VERSION.to_string()),
            Some(message) => find_version(&message).map(str::to_string).ok_or_else(|| {
                GoopsError::pattern_not_found(format!(
                    "version not found in merge commit message: {}",
                    message.trim()
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_branch_exists_matches_suffix() {
        let repo = MockRepository::new()
            .with_remote_branch("origin/4.45-stable")
            .with_remote_branch("origin/14.5-stable");

        assert!(repo.stable_branch_exists(4, 45).unwrap());
        assert!(repo.stable_branch_exists(14, 5).unwrap());
        assert!(!repo.stable_branch_exists(4, 5).unwrap());
    }

    #[test]
    fn test_branch_exists_matches_fragment() {
        let repo = MockRepository::new().with_remote_branch("origin/release-1.3.0");
        assert!(repo.branch_exists("1.3.0").unwrap());
        assert!(!repo.branch_exists("1.4.0").unwrap());
    }

    #[test]
    fn test_previously_merged_version() {
        let repo = MockRepository::new()
            .with_merge_message("Merge branch 'release-2.4.0' into 'master'");
        assert_eq!(repo.previously_merged_version().unwrap(), "2.4.0");
    }

    #[test]
    fn test_previously_merged_version_without_merges() {
        let repo = MockRepository::new();
        assert_eq!(repo.previously_merged_version().unwrap(), INITIAL_VERSION);
    }

    #[test]
    fn test_previously_merged_version_without_version() {
        let repo = MockRepository::new().with_merge_message("Merge branch 'feature/login'");
        let err = repo.previously_merged_version().unwrap_err();
        assert!(matches!(err, GoopsError::PatternNotFound(_)));
    }
}
