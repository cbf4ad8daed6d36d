use crate::error::{GoopsError, Result};
use crate::git::RepositoryFacts;

/// Mock repository for testing without actual git operations
#[derive(Debug, Clone)]
pub struct MockRepository {
    head_tag: Option<String>,
    previous_tag: Option<String>,
    branch: String,
    remote_branches: Vec<String>,
    commit_message: String,
    merge_message: Option<String>,
    failing_tag_lookups: bool,
    failing_branch_lookup: bool,
}

impl MockRepository {
    /// Create a mock repository on `master` with no tags, branches or merges
    pub fn new() -> Self {
        MockRepository {
            head_tag: None,
            previous_tag: None,
            branch: "master".to_string(),
            remote_branches: Vec::new(),
            commit_message: String::new(),
            merge_message: None,
            failing_tag_lookups: false,
            failing_branch_lookup: false,
        }
    }

    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_head_tag(mut self, tag: impl Into<String>) -> Self {
        self.head_tag = Some(tag.into());
        self
    }

    pub fn with_previous_tag(mut self, tag: impl Into<String>) -> Self {
        self.previous_tag = Some(tag.into());
        self
    }

    pub fn with_remote_branch(mut self, branch: impl Into<String>) -> Self {
        self.remote_branches.push(branch.into());
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn with_merge_message(mut self, message: impl Into<String>) -> Self {
        self.merge_message = Some(message.into());
        self
    }

    /// Make both tag lookups fail, as `git describe` does in a repository without tags
    pub fn with_failing_tag_lookups(mut self) -> Self {
        self.failing_tag_lookups = true;
        self
    }

    pub fn with_failing_branch_lookup(mut self) -> Self {
        self.failing_branch_lookup = true;
        self
    }

    fn tag_lookup(&self, tag: &Option<String>) -> Result<Option<String>> {
        if self.failing_tag_lookups {
            return Err(GoopsError::fact_unavailable("No names found, cannot describe anything"));
        }
        Ok(tag.clone())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryFacts for MockRepository {
    fn head_tag(&self) -> Result<Option<String>> {
        self.tag_lookup(&self.head_tag)
    }

    fn previous_tag(&self) -> Result<Option<String>> {
        self.tag_lookup(&self.previous_tag)
    }

    fn current_branch(&self) -> Result<String> {
        if self.failing_branch_lookup {
            return Err(GoopsError::fact_unavailable("HEAD does not point to a branch"));
        }
        Ok(self.branch.clone())
    }

    fn remote_branches(&self) -> Result<Vec<String>> {
        Ok(self.remote_branches.clone())
    }

    fn last_commit_message(&self) -> Result<String> {
        Ok(self.commit_message.clone())
    }

    fn last_merge_message(&self) -> Result<Option<String>> {
        Ok(self.merge_message.clone())
    }
}
