use regex::Regex;
use std::sync::LazyLock;

static ISSUE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+-\d+").expect("valid issue key regex"));
static MERGE_REQUEST_IID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!(\d+)").expect("valid merge request regex"));

/// Upper bound on keys taken from a single text
pub const MAX_ISSUE_KEYS: usize = 99;

/// Issue tracker keys (`PROJ-123`) mentioned in a text, in order of appearance
pub fn extract_issue_keys(text: &str) -> Vec<String> {
    ISSUE_KEY
        .find_iter(text)
        .take(MAX_ISSUE_KEYS)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Merge request iid referenced as `!42` in a merge commit message
pub fn merge_request_iid(message: &str) -> Option<String> {
    MERGE_REQUEST_IID
        .captures(message)
        .map(|captures| captures[1].to_string())
}

/// Project part of an issue key (`PROJ` for `PROJ-123`)
pub fn project_key(issue: &str) -> Option<&str> {
    issue
        .rsplit_once('-')
        .map(|(project, _)| project)
        .filter(|project| !project.is_empty())
}
