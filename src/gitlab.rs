use crate::config::{Config, CI_API_V4_URL, CI_GITLAB_TOKEN};
use crate::error::{GoopsError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "goops";
const TIMEOUT: Duration = Duration::from_secs(60);

/// The fields of a GitLab merge request goops reads
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MergeRequest {
    #[serde(default)]
    pub iid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Source of merge requests, implemented by [GitlabClient]
pub trait MergeRequestSource {
    fn merge_request(&self, project_id: &str, iid: &str) -> Result<MergeRequest>;
}

/// Blocking client for the GitLab v4 REST API
pub struct GitlabClient {
    client: Client,
    api_url: String,
    token: String,
}

impl GitlabClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(GitlabClient {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Client for `CI_API_V4_URL` authenticated with `CI_GITLAB_TOKEN`
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate_required(&[CI_API_V4_URL, CI_GITLAB_TOKEN])?;
        let api_url = config.gitlab.api_url.as_deref().unwrap_or_default();
        let token = config.gitlab.token.as_deref().unwrap_or_default();
        GitlabClient::new(api_url, token)
    }

    pub fn merge_request_url(&self, project_id: &str, iid: &str) -> String {
        format!(
            "{}/projects/{}/merge_requests/{}",
            self.api_url, project_id, iid
        )
    }
}

impl MergeRequestSource for GitlabClient {
    fn merge_request(&self, project_id: &str, iid: &str) -> Result<MergeRequest> {
        let url = self.merge_request_url(project_id, iid);
        debug!(url = %url, "fetching merge request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("Private-Token", &self.token)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if status.is_client_error() || status.is_server_error() {
            return Err(GoopsError::http(format!(
                "GET {}: status {}: {}",
                url,
                status.as_u16(),
                body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            GoopsError::http(format!("GET {}: invalid JSON ({}): {}", url, e, body))
        })
    }
}
