use crate::domain::branch::DETACHED_HEAD;
use crate::domain::SemanticVersion;
use crate::error::{GoopsError, Result};
use crate::git::{RepositoryFacts, NIGHTLY_TAG};
use git2::{BranchType, Oid, Repository as Git2Repo, Sort};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Wrapper around git2::Repository answering [RepositoryFacts] queries
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn head_oid(&self) -> Result<Oid> {
        let head = self.repo.head()?;
        Ok(head.peel_to_commit()?.id())
    }

    /// Release tags grouped by the commit they point at, annotated tags peeled
    fn tags_by_commit(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let mut tags: HashMap<Oid, Vec<String>> = HashMap::new();

        for name in self.repo.tag_names(None)?.iter().flatten() {
            if name == NIGHTLY_TAG {
                continue;
            }
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            match reference.peel_to_commit() {
                Ok(commit) => tags.entry(commit.id()).or_default().push(name.to_string()),
                Err(e) => debug!(tag = name, error = %e, "skipping tag that does not point at a commit"),
            }
        }

        for names in tags.values_mut() {
            names.sort_by_cached_key(|name| tag_order(name));
        }
        Ok(tags)
    }
}

/// Sort key for tags on one commit: version tags last, compared numerically,
/// a plain release after its prerelease
fn tag_order(name: &str) -> (Option<(u64, u64, u64, bool)>, String) {
    let version = SemanticVersion::parse(name)
        .ok()
        .map(|v| (v.major, v.minor, v.patch, v.prerelease.is_none()));
    (version, name.to_string())
}

impl RepositoryFacts for Git2Repository {
    fn head_tag(&self) -> Result<Option<String>> {
        let head = self.head_oid()?;
        let mut tags = self.tags_by_commit()?;

        Ok(tags.remove(&head).and_then(|mut names| names.pop()))
    }

    fn previous_tag(&self) -> Result<Option<String>> {
        let head = self.head_oid()?;
        let mut tags = self.tags_by_commit()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head)?;

        for oid in revwalk {
            let oid = oid?;
            if let Some(mut names) = tags.remove(&oid) {
                return Ok(names.pop());
            }
        }

        Ok(None)
    }

    fn current_branch(&self) -> Result<String> {
        if self.repo.head_detached()? {
            return Ok(DETACHED_HEAD.to_string());
        }

        let head = self.repo.head()?;
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| GoopsError::fact_unavailable("HEAD has no readable branch name"))
    }

    fn remote_branches(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for branch in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    fn last_commit_message(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.message().unwrap_or_default().to_string())
    }

    fn last_merge_message(&self) -> Result<Option<String>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(self.head_oid()?)?;

        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if commit.parent_count() > 1 {
                return Ok(Some(commit.message().unwrap_or_default().to_string()));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Commit, Signature};
    use tempfile::TempDir;

    fn commit<'r>(repo: &'r Git2Repo, message: &str, parents: &[&Commit<'r>]) -> Commit<'r> {
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, parents)
            .unwrap();
        repo.find_commit(oid).unwrap()
    }

    fn init_repo() -> (TempDir, Git2Repo) {
        let temp = TempDir::new().unwrap();
        let repo = Git2Repo::init(temp.path()).unwrap();
        (temp, repo)
    }

    #[test]
    fn test_head_and_previous_tag() {
        let (temp, repo) = init_repo();
        {
            let first = commit(&repo, "initial", &[]);
            repo.tag_lightweight("1.0.0", first.as_object(), false)
                .unwrap();
            let second = commit(&repo, "second", &[&first]);
            repo.tag_lightweight(NIGHTLY_TAG, second.as_object(), false)
                .unwrap();
        }

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(facts.head_tag().unwrap(), None);
        assert_eq!(facts.previous_tag().unwrap().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_highest_version_wins_among_tags_on_one_commit() {
        let (temp, repo) = init_repo();
        {
            let first = commit(&repo, "initial", &[]);
            for tag in ["1.10.0", "build-42", "1.9.0"] {
                repo.tag_lightweight(tag, first.as_object(), false)
                    .unwrap();
            }
            commit(&repo, "second", &[&first]);
        }

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(facts.previous_tag().unwrap().as_deref(), Some("1.10.0"));

        repo.set_head_detached(repo.revparse_single("1.9.0").unwrap().id())
            .unwrap();
        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(facts.head_tag().unwrap().as_deref(), Some("1.10.0"));
    }

    #[test]
    fn test_tag_order_prefers_versions() {
        let mut names = vec!["1.10.0", "zeta", "1.9.0", "1.10.0-rc"];
        names.sort_by_cached_key(|name| tag_order(name));
        assert_eq!(names, vec!["zeta", "1.9.0", "1.10.0-rc", "1.10.0"]);
    }

    #[test]
    fn test_annotated_head_tag() {
        let (temp, repo) = init_repo();
        {
            let first = commit(&repo, "initial", &[]);
            let sig = Signature::now("Test", "test@example.com").unwrap();
            repo.tag("2.1.0", first.as_object(), &sig, "release 2.1.0", false)
                .unwrap();
        }

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(facts.head_tag().unwrap().as_deref(), Some("2.1.0"));
    }

    #[test]
    fn test_no_tags() {
        let (temp, repo) = init_repo();
        commit(&repo, "initial", &[]);

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(facts.head_tag().unwrap(), None);
        assert_eq!(facts.previous_tag().unwrap(), None);
    }

    #[test]
    fn test_current_branch_and_commit_message() {
        let (temp, repo) = init_repo();
        commit(&repo, "PROJ-1 add login", &[]);
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("2.2-stable", &head, true).unwrap();
        repo.set_head("refs/heads/2.2-stable").unwrap();

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(facts.current_branch().unwrap(), "2.2-stable");
        assert_eq!(facts.last_commit_message().unwrap(), "PROJ-1 add login");
    }

    #[test]
    fn test_detached_head_branch_name() {
        let (temp, repo) = init_repo();
        let oid = commit(&repo, "initial", &[]).id();
        repo.set_head_detached(oid).unwrap();

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(facts.current_branch().unwrap(), "HEAD");
    }

    #[test]
    fn test_last_merge_message() {
        let (temp, repo) = init_repo();
        {
            let base = commit(&repo, "initial", &[]);
            let side = commit(&repo, "feature work", &[&base]);
            let merge = commit(
                &repo,
                "Merge branch 'release-1.4.0' into 'master'",
                &[&side, &base],
            );
            commit(&repo, "after merge", &[&merge]);
        }

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(
            facts.last_merge_message().unwrap().as_deref(),
            Some("Merge branch 'release-1.4.0' into 'master'")
        );
        assert_eq!(facts.previously_merged_version().unwrap(), "1.4.0");
    }

    #[test]
    fn test_remote_branches_empty_without_remotes() {
        let (temp, repo) = init_repo();
        commit(&repo, "initial", &[]);

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert!(facts.remote_branches().unwrap().is_empty());
        assert!(!facts.stable_branch_exists(1, 0).unwrap());
    }

    #[test]
    fn test_remote_branches_listed() {
        let (temp, repo) = init_repo();
        let oid = commit(&repo, "initial", &[]).id();
        repo.reference("refs/remotes/origin/3.1-stable", oid, true, "test remote")
            .unwrap();

        let facts = Git2Repository::open(temp.path()).unwrap();
        assert_eq!(facts.remote_branches().unwrap(), vec!["origin/3.1-stable"]);
        assert!(facts.stable_branch_exists(3, 1).unwrap());
    }
}
