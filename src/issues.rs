use crate::config::{Config, CI_PROJECT_ID};
use crate::domain::issue::{extract_issue_keys, merge_request_iid};
use crate::error::{GoopsError, Result};
use crate::git::RepositoryFacts;
use crate::gitlab::{GitlabClient, MergeRequestSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Where issue keys for the current build are read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStrategy {
    /// The last commit message, as reviewed in Gerrit
    #[default]
    Gerrit,
    /// Title and description of the GitLab merge request
    Gitlab,
}

impl IssueStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            IssueStrategy::Gerrit => "gerrit",
            IssueStrategy::Gitlab => "gitlab",
        }
    }
}

impl fmt::Display for IssueStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IssueStrategy {
    type Err = GoopsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "gerrit" => Ok(IssueStrategy::Gerrit),
            "gitlab" => Ok(IssueStrategy::Gitlab),
            other => Err(GoopsError::config(format!(
                "unsupported issue strategy: '{}' (expected gerrit or gitlab)",
                other
            ))),
        }
    }
}

/// Issue keys mentioned in the HEAD commit message
pub fn gerrit_issue_keys<R: RepositoryFacts + ?Sized>(facts: &R) -> Result<Vec<String>> {
    Ok(extract_issue_keys(&facts.last_commit_message()?))
}

/// Issue keys from the merge request being built, or the one merged last.
///
/// `merge_request_iid` comes from CI; without it the iid is read from the last
/// merge commit message (`See merge request group/project!42`).
pub fn gitlab_issue_keys<R, S>(
    facts: &R,
    project_id: &str,
    merge_request_iid_override: Option<&str>,
    merge_requests: &S,
) -> Result<Vec<String>>
where
    R: RepositoryFacts + ?Sized,
    S: MergeRequestSource + ?Sized,
{
    let iid = match merge_request_iid_override.filter(|iid| !iid.is_empty()) {
        Some(iid) => iid.to_string(),
        None => previous_merge_request_iid(facts)?,
    };
    debug!(project_id, iid = %iid, "reading issue keys from merge request");

    let merge_request = merge_requests.merge_request(project_id, &iid)?;
    let mut keys = extract_issue_keys(&merge_request.title);
    keys.extend(extract_issue_keys(
        merge_request.description.as_deref().unwrap_or_default(),
    ));
    Ok(keys)
}

fn previous_merge_request_iid<R: RepositoryFacts + ?Sized>(facts: &R) -> Result<String> {
    let message = facts.last_merge_message()?.unwrap_or_default();
    merge_request_iid(&message).ok_or_else(|| {
        GoopsError::pattern_not_found(format!(
            "merge request iid not found in merge commit message: {}",
            message.trim()
        ))
    })
}

/// Collect issue keys with the configured strategy
pub fn collect_issue_keys<R: RepositoryFacts + ?Sized>(
    config: &Config,
    facts: &R,
) -> Result<Vec<String>> {
    match config.jira.strategy {
        IssueStrategy::Gerrit => gerrit_issue_keys(facts),
        IssueStrategy::Gitlab => {
            config.validate_required(&[CI_PROJECT_ID])?;
            let client = GitlabClient::from_config(config)?;
            gitlab_issue_keys(
                facts,
                config.ci.project_id.as_deref().unwrap_or_default(),
                config.ci.merge_request_iid.as_deref(),
                &client,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::gitlab::MergeRequest;
    use std::cell::RefCell;

    struct FakeGitlab {
        merge_request: MergeRequest,
        requested: RefCell<Vec<(String, String)>>,
    }

    impl FakeGitlab {
        fn new(title: &str, description: Option<&str>) -> Self {
            FakeGitlab {
                merge_request: MergeRequest {
                    iid: 3,
                    title: title.to_string(),
                    description: description.map(str::to_string),
                    state: None,
                },
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl MergeRequestSource for FakeGitlab {
        fn merge_request(&self, project_id: &str, iid: &str) -> Result<MergeRequest> {
            self.requested
                .borrow_mut()
                .push((project_id.to_string(), iid.to_string()));
            Ok(self.merge_request.clone())
        }
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("gerrit".parse::<IssueStrategy>().unwrap(), IssueStrategy::Gerrit);
        assert_eq!("gitlab".parse::<IssueStrategy>().unwrap(), IssueStrategy::Gitlab);
        assert!(matches!(
            "github".parse::<IssueStrategy>().unwrap_err(),
            GoopsError::Config(_)
        ));
    }

    #[test]
    fn test_gerrit_issue_keys() {
        let repo = MockRepository::new()
            .with_commit_message("PROJ-12 fix login\n\nAlso touches PROJ-13");
        assert_eq!(gerrit_issue_keys(&repo).unwrap(), vec!["PROJ-12", "PROJ-13"]);
    }

    #[test]
    fn test_gitlab_issue_keys_title_then_description() {
        let repo = MockRepository::new();
        let gitlab = FakeGitlab::new("PROJ-1 add export", Some("Closes PROJ-2 and OPS-3"));

        let keys = gitlab_issue_keys(&repo, "42", Some("3"), &gitlab).unwrap();

        assert_eq!(keys, vec!["PROJ-1", "PROJ-2", "OPS-3"]);
        assert_eq!(
            gitlab.requested.borrow().as_slice(),
            &[("42".to_string(), "3".to_string())]
        );
    }

    #[test]
    fn test_gitlab_issue_keys_from_merge_commit() {
        let repo = MockRepository::new().with_merge_message(
            "Merge branch 'feature' into 'master'\n\nSee merge request group/app!17",
        );
        let gitlab = FakeGitlab::new("PROJ-5", None);

        let keys = gitlab_issue_keys(&repo, "42", None, &gitlab).unwrap();

        assert_eq!(keys, vec!["PROJ-5"]);
        assert_eq!(gitlab.requested.borrow()[0].1, "17");
    }

    #[test]
    fn test_gitlab_issue_keys_without_iid() {
        let repo = MockRepository::new().with_merge_message("Merge branch 'feature'");
        let gitlab = FakeGitlab::new("PROJ-5", None);

        let err = gitlab_issue_keys(&repo, "42", Some(""), &gitlab).unwrap_err();
        assert!(matches!(err, GoopsError::PatternNotFound(_)));
        assert!(gitlab.requested.borrow().is_empty());
    }

    #[test]
    fn test_collect_gitlab_requires_project_id() {
        let mut config = Config::default();
        config.jira.strategy = IssueStrategy::Gitlab;

        let err = collect_issue_keys(&config, &MockRepository::new()).unwrap_err();
        assert!(err.to_string().contains("CI_PROJECT_ID"));
    }

    #[test]
    fn test_collect_gerrit() {
        let repo = MockRepository::new().with_commit_message("OPS-9 bump");
        assert_eq!(
            collect_issue_keys(&Config::default(), &repo).unwrap(),
            vec!["OPS-9"]
        );
    }
}
