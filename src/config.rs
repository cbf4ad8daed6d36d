use crate::error::{GoopsError, Result};
use crate::issues::IssueStrategy;
use crate::release::{ReleaseStrategy, ResolverConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOCAL_CONFIG_FILE: &str = ".goops.toml";
pub const DEFAULT_EXPORT_FILE: &str = ".goops.env";
pub const DEFAULT_EXPORT_PREFIX: &str = "GOOPS_";

pub const GOOPSC_SEMVER: &str = "GOOPSC_SEMVER";
pub const GOOPSC_SEMVER_STRATEGY: &str = "GOOPSC_SEMVER_STRATEGY";
pub const GOOPSC_SAVE_EXPORT: &str = "GOOPSC_SAVE_EXPORT";
pub const GOOPSC_EXPORT_FILE: &str = "GOOPSC_EXPORT_FILE";
pub const GOOPSC_JIRA: &str = "GOOPSC_JIRA";
pub const GOOPSC_JIRA_STRATEGY: &str = "GOOPSC_JIRA_STRATEGY";
pub const GOOPSC_JIRA_SERVER_URL: &str = "GOOPSC_JIRA_SERVER_URL";
pub const GOOPSC_JIRA_USER: &str = "GOOPSC_JIRA_USER";
pub const GOOPSC_JIRA_PASSWORD: &str = "GOOPSC_JIRA_PASSWORD";
pub const GOOPSC_JIRA_PROJECT_KEY: &str = "GOOPSC_JIRA_PROJECT_KEY";
pub const GOOPSC_JIRA_VERSION_ASSIGN: &str = "GOOPSC_JIRA_VERSION_ASSIGN";
pub const GOOPSC_JIRA_VERSION_CREATE: &str = "GOOPSC_JIRA_VERSION_CREATE";
pub const GOOPSC_JIRA_CREATE_DEPLOYMENT_ISSUE: &str = "GOOPSC_JIRA_CREATE_DEPLOYMENT_ISSUE";
pub const GOOPSC_JIRA_ISSUE_TRANSITION: &str = "GOOPSC_JIRA_ISSUE_TRANSITION";
pub const CI_COMMIT_REF_NAME: &str = "CI_COMMIT_REF_NAME";
pub const CI_COMMIT_TAG: &str = "CI_COMMIT_TAG";
pub const CI_PROJECT_ID: &str = "CI_PROJECT_ID";
pub const CI_MERGE_REQUEST_IID: &str = "CI_MERGE_REQUEST_IID";
pub const CI_API_V4_URL: &str = "CI_API_V4_URL";
pub const CI_GITLAB_TOKEN: &str = "CI_GITLAB_TOKEN";

/// Complete goops configuration.
///
/// Values come from a TOML file first and are then overridden by `GOOPSC_*` and
/// CI provided environment variables, see [Config::apply_env].
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub semver: SemverConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub ci: CiConfig,

    #[serde(default)]
    pub gitlab: GitlabConfig,

    #[serde(default)]
    pub jira: JiraConfig,

    #[serde(default)]
    pub docker: DockerConfig,
}

fn default_true() -> bool {
    true
}

/// Version resolution settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SemverConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_strategy")]
    pub strategy: ReleaseStrategy,

    /// Append resolved versions to the export file
    #[serde(default = "default_true")]
    pub save_export: bool,
}

fn default_strategy() -> ReleaseStrategy {
    ReleaseStrategy::GithubFlow
}

impl Default for SemverConfig {
    fn default() -> Self {
        SemverConfig {
            enabled: true,
            strategy: default_strategy(),
            save_export: true,
        }
    }
}

/// Where exported variables are written and how they are named
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "default_export_file")]
    pub file: PathBuf,

    #[serde(default = "default_export_prefix")]
    pub prefix: String,
}

fn default_export_file() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_FILE)
}

fn default_export_prefix() -> String {
    DEFAULT_EXPORT_PREFIX.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            file: default_export_file(),
            prefix: default_export_prefix(),
        }
    }
}

/// Facts about the pipeline, usually provided by GitLab CI
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CiConfig {
    pub ref_name: Option<String>,
    pub commit_tag: Option<String>,
    pub project_id: Option<String>,
    pub merge_request_iid: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct GitlabConfig {
    pub api_url: Option<String>,
    pub token: Option<String>,
}

/// Issue tracker integration, disabled unless asked for
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct JiraConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub strategy: IssueStrategy,

    pub server_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,

    /// Project of the deployment issue and created versions; defaults to the issue's project
    pub project_key: Option<String>,

    #[serde(default = "default_true")]
    pub version_assign: bool,

    #[serde(default)]
    pub version_create: bool,

    #[serde(default)]
    pub create_deployment_issue: bool,

    #[serde(default = "default_true")]
    pub issue_transition: bool,
}

impl Default for JiraConfig {
    fn default() -> Self {
        JiraConfig {
            enabled: false,
            strategy: IssueStrategy::default(),
            server_url: None,
            user: None,
            password: None,
            project_key: None,
            version_assign: true,
            version_create: false,
            create_deployment_issue: false,
            issue_transition: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DockerConfig {
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
}

fn default_dockerfile() -> String {
    "Dockerfile".to_string()
}

impl Default for DockerConfig {
    fn default() -> Self {
        DockerConfig {
            dockerfile: default_dockerfile(),
        }
    }
}

impl Config {
    /// Parse a TOML document, missing sections and keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| GoopsError::config(e.to_string()))
    }

    /// Override file values with environment variables.
    ///
    /// `lookup` returns the value of a variable; empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let flag = |name: &str| -> Result<Option<bool>> {
            var(name).map(|value| parse_bool(name, &value)).transpose()
        };

        if let Some(enabled) = flag(GOOPSC_SEMVER)? {
            self.semver.enabled = enabled;
        }
        if let Some(strategy) = var(GOOPSC_SEMVER_STRATEGY) {
            self.semver.strategy = strategy.parse()?;
        }
        if let Some(save) = flag(GOOPSC_SAVE_EXPORT)? {
            self.semver.save_export = save;
        }
        if let Some(file) = var(GOOPSC_EXPORT_FILE) {
            self.export.file = PathBuf::from(file);
        }

        if let Some(enabled) = flag(GOOPSC_JIRA)? {
            self.jira.enabled = enabled;
        }
        if let Some(strategy) = var(GOOPSC_JIRA_STRATEGY) {
            self.jira.strategy = strategy.parse()?;
        }
        override_with(&mut self.jira.server_url, var(GOOPSC_JIRA_SERVER_URL));
        override_with(&mut self.jira.user, var(GOOPSC_JIRA_USER));
        override_with(&mut self.jira.password, var(GOOPSC_JIRA_PASSWORD));
        override_with(&mut self.jira.project_key, var(GOOPSC_JIRA_PROJECT_KEY));
        if let Some(assign) = flag(GOOPSC_JIRA_VERSION_ASSIGN)? {
            self.jira.version_assign = assign;
        }
        if let Some(create) = flag(GOOPSC_JIRA_VERSION_CREATE)? {
            self.jira.version_create = create;
        }
        if let Some(create) = flag(GOOPSC_JIRA_CREATE_DEPLOYMENT_ISSUE)? {
            self.jira.create_deployment_issue = create;
        }
        if let Some(transition) = flag(GOOPSC_JIRA_ISSUE_TRANSITION)? {
            self.jira.issue_transition = transition;
        }

        override_with(&mut self.ci.ref_name, var(CI_COMMIT_REF_NAME));
        override_with(&mut self.ci.commit_tag, var(CI_COMMIT_TAG));
        override_with(&mut self.ci.project_id, var(CI_PROJECT_ID));
        override_with(&mut self.ci.merge_request_iid, var(CI_MERGE_REQUEST_IID));
        override_with(&mut self.gitlab.api_url, var(CI_API_V4_URL));
        override_with(&mut self.gitlab.token, var(CI_GITLAB_TOKEN));

        Ok(())
    }

    /// Value of a setting by the environment variable that controls it
    pub fn setting(&self, name: &str) -> Option<String> {
        let value = match name {
            GOOPSC_SEMVER => Some(self.semver.enabled.to_string()),
            GOOPSC_SEMVER_STRATEGY => Some(self.semver.strategy.to_string()),
            GOOPSC_SAVE_EXPORT => Some(self.semver.save_export.to_string()),
            GOOPSC_EXPORT_FILE => Some(self.export.file.display().to_string()),
            GOOPSC_JIRA => Some(self.jira.enabled.to_string()),
            GOOPSC_JIRA_STRATEGY => Some(self.jira.strategy.to_string()),
            GOOPSC_JIRA_SERVER_URL => self.jira.server_url.clone(),
            GOOPSC_JIRA_USER => self.jira.user.clone(),
            GOOPSC_JIRA_PASSWORD => self.jira.password.clone(),
            GOOPSC_JIRA_PROJECT_KEY => self.jira.project_key.clone(),
            CI_COMMIT_REF_NAME => self.ci.ref_name.clone(),
            CI_COMMIT_TAG => self.ci.commit_tag.clone(),
            CI_PROJECT_ID => self.ci.project_id.clone(),
            CI_MERGE_REQUEST_IID => self.ci.merge_request_iid.clone(),
            CI_API_V4_URL => self.gitlab.api_url.clone(),
            CI_GITLAB_TOKEN => self.gitlab.token.clone(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }

    /// Fail with every unset setting named at once
    pub fn validate_required(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| self.setting(name).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(GoopsError::config(format!(
                "required variables not set: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            strategy: self.semver.strategy,
            ci_ref_name: self.ci.ref_name.clone(),
        }
    }
}

fn override_with(target: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *target = value;
    }
}

/// Parse a boolean environment value
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(GoopsError::config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

/// Locate the configuration file.
///
/// Search order:
/// 1. Custom path provided as parameter
/// 2. `.goops.toml` in current directory
/// 3. `goops/config.toml` in the user config directory
pub fn find_config_file(config_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(PathBuf::from(path));
    }
    let local = Path::new(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local.to_path_buf());
    }
    dirs::config_dir()
        .map(|dir| dir.join("goops").join("config.toml"))
        .filter(|path| path.exists())
}

/// Loads configuration from file or returns defaults.
///
/// A custom path that cannot be read is an error; a missing default file is not.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    match find_config_file(config_path) {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            let content = fs::read_to_string(&path).map_err(|e| {
                GoopsError::config(format!("cannot read {}: {}", path.display(), e))
            })?;
            Config::from_toml_str(&content)
        }
        None => Ok(Config::default()),
    }
}

/// Load the file configuration and apply environment overrides
pub fn load<F>(config_path: Option<&str>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = load_config(config_path)?;
    config.apply_env(lookup)?;
    Ok(config)
}
