//! Blocking client for the Jira REST API v2
//!
//! Only the calls goops needs are covered: fix version assignment, version
//! creation, deployment issue creation and workflow transitions.

use crate::config::{Config, GOOPSC_JIRA_PASSWORD, GOOPSC_JIRA_SERVER_URL, GOOPSC_JIRA_USER};
use crate::domain::issue::project_key;
use crate::error::{GoopsError, Result};
use reqwest::blocking::Client;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

const API: &str = "/rest/api/2";
const USER_AGENT: &str = "goops";
const TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JiraVersion {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub released: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub to: Option<TransitionTarget>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TransitionTarget {
    pub name: String,
}

impl Transition {
    /// True when the transition is named `state` or leads to a status named `state`
    pub fn leads_to(&self, state: &str) -> bool {
        self.name.eq_ignore_ascii_case(state)
            || self
                .to
                .as_ref()
                .is_some_and(|to| to.name.eq_ignore_ascii_case(state))
    }
}

#[derive(Debug, Deserialize)]
struct TransitionList {
    transitions: Vec<Transition>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreatedIssue {
    pub key: String,
}

/// Fields of the issue recording a deployment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentIssue {
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

impl DeploymentIssue {
    /// Fill empty fields with defaults derived from the version
    pub fn or_defaults(&self, version: &str) -> DeploymentIssue {
        let pick = |value: &str, default: String| {
            if value.trim().is_empty() {
                default
            } else {
                value.to_string()
            }
        };
        DeploymentIssue {
            summary: pick(&self.summary, format!("Deployment {}", version)),
            description: pick(&self.description, format!("Deployment of version {}", version)),
            issue_type: pick(&self.issue_type, "Task".to_string()),
        }
    }
}

pub fn fix_version_payload(version: &str) -> Value {
    json!({
        "update": {
            "fixVersions": [ { "add": { "name": version } } ]
        }
    })
}

pub fn version_payload(project: &str, version: &str) -> Value {
    json!({
        "name": version,
        "project": project,
        "released": false,
    })
}

pub fn issue_payload(project: &str, issue: &DeploymentIssue, version: &str) -> Value {
    json!({
        "fields": {
            "project": { "key": project },
            "summary": issue.summary,
            "description": issue.description,
            "issuetype": { "name": issue.issue_type },
            "fixVersions": [ { "name": version } ],
        }
    })
}

pub fn transition_payload(transition_id: &str) -> Value {
    json!({ "transition": { "id": transition_id } })
}

/// Issue tracker operations used by the setenv and transition workflows
pub trait IssueTracker {
    fn assign_version(&self, issue: &str, version: &str) -> Result<()>;
    fn ensure_version(&self, project: &str, version: &str) -> Result<JiraVersion>;
    fn create_issue(&self, project: &str, issue: &DeploymentIssue, version: &str)
        -> Result<CreatedIssue>;
    fn transition(&self, issue: &str, state: &str) -> Result<()>;
}

pub struct JiraClient {
    client: Client,
    server_url: String,
    user: String,
    password: String,
}

impl JiraClient {
    pub fn new(server_url: &str, user: &str, password: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(JiraClient {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    /// Client for the configured server, failing with every missing credential named
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate_required(&[GOOPSC_JIRA_SERVER_URL, GOOPSC_JIRA_USER, GOOPSC_JIRA_PASSWORD])?;
        JiraClient::new(
            config.jira.server_url.as_deref().unwrap_or_default(),
            config.jira.user.as_deref().unwrap_or_default(),
            config.jira.password.as_deref().unwrap_or_default(),
        )
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.server_url, API, endpoint)
    }

    fn send(&self, method: Method, endpoint: &str, payload: Option<&Value>) -> Result<String> {
        let url = self.url(endpoint);
        debug!(method = %method, url = %url, "jira request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json");
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        if status.is_client_error() || status.is_server_error() {
            return Err(GoopsError::http(format!(
                "{} {}: status {}: {}",
                method,
                endpoint,
                status.as_u16(),
                body
            )));
        }
        Ok(body)
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<T> {
        let body = self.send(method.clone(), endpoint, payload)?;
        serde_json::from_str(&body).map_err(|e| {
            GoopsError::http(format!(
                "{} {}: invalid JSON ({}): {}",
                method, endpoint, e, body
            ))
        })
    }

    pub fn project_versions(&self, project: &str) -> Result<Vec<JiraVersion>> {
        self.send_json(Method::GET, &format!("/project/{}/versions", project), None)
    }

    pub fn create_version(&self, project: &str, version: &str) -> Result<JiraVersion> {
        info!(project, version, "creating version");
        self.send_json(
            Method::POST,
            "/version",
            Some(&version_payload(project, version)),
        )
    }

    pub fn transitions(&self, issue: &str) -> Result<Vec<Transition>> {
        let list: TransitionList =
            self.send_json(Method::GET, &format!("/issue/{}/transitions", issue), None)?;
        Ok(list.transitions)
    }
}

impl IssueTracker for JiraClient {
    /// Add `version` to the fix versions of `issue`
    fn assign_version(&self, issue: &str, version: &str) -> Result<()> {
        info!(issue, version, "assigning fix version");
        self.send(
            Method::PUT,
            &format!("/issue/{}", issue),
            Some(&fix_version_payload(version)),
        )?;
        Ok(())
    }

    /// Create `version` in `project` unless it already exists
    fn ensure_version(&self, project: &str, version: &str) -> Result<JiraVersion> {
        let existing = self
            .project_versions(project)?
            .into_iter()
            .find(|v| v.name == version);
        match existing {
            Some(found) => Ok(found),
            None => self.create_version(project, version),
        }
    }

    fn create_issue(
        &self,
        project: &str,
        issue: &DeploymentIssue,
        version: &str,
    ) -> Result<CreatedIssue> {
        info!(project, summary = %issue.summary, "creating deployment issue");
        self.send_json(
            Method::POST,
            "/issue",
            Some(&issue_payload(project, issue, version)),
        )
    }

    /// Move `issue` to the workflow state named `state`
    fn transition(&self, issue: &str, state: &str) -> Result<()> {
        let transitions = self.transitions(issue)?;
        let transition = transitions
            .iter()
            .find(|t| t.leads_to(state))
            .ok_or_else(|| {
                let available: Vec<&str> = transitions.iter().map(|t| t.name.as_str()).collect();
                GoopsError::pattern_not_found(format!(
                    "no transition to '{}' for {} (available: {})",
                    state,
                    issue,
                    available.join(", ")
                ))
            })?;

        info!(issue, state, transition = %transition.id, "transitioning issue");
        self.send(
            Method::POST,
            &format!("/issue/{}/transitions", issue),
            Some(&transition_payload(&transition.id)),
        )?;
        Ok(())
    }
}

/// Project that owns created versions: the configured key, else the issue's project
pub fn version_project<'a>(configured: Option<&'a str>, issue: &'a str) -> Option<&'a str> {
    configured.filter(|key| !key.is_empty()).or_else(|| project_key(issue))
}
