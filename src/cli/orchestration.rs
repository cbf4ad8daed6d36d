//! Command workflows
//!
//! Each `goops` subcommand that does more than one thing has a workflow here.
//! Workflows take already loaded configuration and injected collaborators and
//! return what they did; printing and process exit stay in `main`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::error::{GoopsError, Result};
use crate::export::ExportFile;
use crate::git::RepositoryFacts;
use crate::issues::collect_issue_keys;
use crate::jira::{version_project, DeploymentIssue, IssueTracker};
use crate::release::{ResolvedVersion, ResolverConfig, VersionResolver};

pub const JIRA_ISSUES: &str = "JIRA_ISSUES";

/// Arguments for the version workflow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionWorkflowArgs {
    /// Print the release form instead of the snapshot form
    pub release: bool,

    /// Append the version variables to the export file
    pub save: bool,

    /// Export file overriding the configured one
    pub file: Option<PathBuf>,

    /// Strategy name overriding the configured one
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VersionWorkflowResult {
    pub resolved: ResolvedVersion,

    /// The version to print
    pub version: String,

    /// Export lines written, in order
    pub exported: Vec<String>,
}

/// Resolve the version of the checkout and optionally export it
pub fn run_version_workflow<R: RepositoryFacts + ?Sized>(
    args: &VersionWorkflowArgs,
    config: &Config,
    facts: &R,
) -> Result<VersionWorkflowResult> {
    let mut resolver_config = config.resolver_config();
    if let Some(strategy) = &args.strategy {
        resolver_config.strategy = strategy.parse()?;
    }
    let resolved = resolve(resolver_config, facts)?;

    let exported = if args.save {
        let mut export = config.export.clone();
        if let Some(file) = &args.file {
            export.file = file.clone();
        }
        ExportFile::from_config(&export).append_all(&resolved.exports())?
    } else {
        Vec::new()
    };

    let version = if args.release {
        resolved.release.clone()
    } else {
        resolved.snapshot.clone()
    };

    Ok(VersionWorkflowResult {
        resolved,
        version,
        exported,
    })
}

fn resolve<R: RepositoryFacts + ?Sized>(
    config: ResolverConfig,
    facts: &R,
) -> Result<ResolvedVersion> {
    VersionResolver::new(config).resolve(facts)
}

/// Arguments for the setenv workflow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetenvWorkflowArgs {
    pub deployment: DeploymentIssue,
}

/// Result of a setenv run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetenvWorkflowResult {
    /// None when version resolution is disabled
    pub version: Option<ResolvedVersion>,

    pub issues: Vec<String>,

    /// Issues that received the release version
    pub assigned: Vec<String>,

    /// Key of the created deployment issue
    pub deployment_issue: Option<String>,

    /// Export lines written, in order
    pub exported: Vec<String>,

    pub warnings: Vec<BoundaryWarning>,
}

/// Export the version and issue keys, then assign the release version to the issues.
///
/// Every step is gated by configuration: `semver.enabled` for resolution,
/// `semver.save_export` for the version exports, `jira.enabled` for issues and
/// `jira.version_assign` for the assignment. A failure to update one issue is
/// recorded as a warning and the remaining issues are still processed.
pub fn run_setenv_workflow<R, T>(
    args: &SetenvWorkflowArgs,
    config: &Config,
    facts: &R,
    tracker: Option<&T>,
) -> Result<SetenvWorkflowResult>
where
    R: RepositoryFacts + ?Sized,
    T: IssueTracker + ?Sized,
{
    let export = ExportFile::from_config(&config.export);
    let mut result = SetenvWorkflowResult::default();

    if config.semver.enabled {
        let resolved = resolve(config.resolver_config(), facts)?;
        if config.semver.save_export {
            result.exported.extend(export.append_all(&resolved.exports())?);
        }
        result.warnings.extend(resolved.warnings.iter().cloned());
        result.version = Some(resolved);
    } else {
        info!("version resolution disabled");
    }

    if !config.jira.enabled {
        info!("issue tracking disabled");
        return Ok(result);
    }

    result.issues = collect_issue_keys(config, facts)?;
    result
        .exported
        .push(export.append(JIRA_ISSUES, &result.issues.join(" "))?);

    let release = result
        .version
        .as_ref()
        .filter(|_| config.jira.version_assign)
        .map(|version| version.release.clone());
    let Some(version) = release else {
        return Ok(result);
    };
    let tracker = tracker.ok_or_else(|| GoopsError::config("issue tracker is not configured"))?;

    if config.jira.version_create {
        let projects: BTreeSet<&str> = result
            .issues
            .iter()
            .filter_map(|issue| version_project(config.jira.project_key.as_deref(), issue))
            .collect();
        for project in projects {
            if let Err(e) = tracker.ensure_version(project, &version) {
                warn!(project, error = %e, "could not create version");
                result.warnings.push(BoundaryWarning::IssueUpdateFailed {
                    issue: project.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    for issue in &result.issues {
        match tracker.assign_version(issue, &version) {
            Ok(()) => result.assigned.push(issue.clone()),
            Err(e) => {
                warn!(issue = %issue, error = %e, "could not assign version");
                result.warnings.push(BoundaryWarning::IssueUpdateFailed {
                    issue: issue.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if config.jira.create_deployment_issue {
        let project = result
            .issues
            .first()
            .and_then(|issue| version_project(config.jira.project_key.as_deref(), issue))
            .or(config.jira.project_key.as_deref().filter(|key| !key.is_empty()))
            .ok_or_else(|| {
                GoopsError::config("GOOPSC_JIRA_PROJECT_KEY is required to create a deployment issue")
            })?;
        let created = tracker.create_issue(project, &args.deployment.or_defaults(&version), &version)?;
        result.deployment_issue = Some(created.key);
    }

    Ok(result)
}

/// Result of a transition run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionWorkflowResult {
    /// False when transitions are disabled by configuration
    pub enabled: bool,
    pub transitioned: Vec<String>,
    pub warnings: Vec<BoundaryWarning>,
}

/// Move every space separated issue in `issues` to `state`
pub fn run_transition_workflow<T: IssueTracker + ?Sized>(
    issues: &str,
    state: &str,
    config: &Config,
    tracker: Option<&T>,
) -> Result<TransitionWorkflowResult> {
    let mut result = TransitionWorkflowResult::default();
    if !config.jira.enabled || !config.jira.issue_transition {
        info!("issue transitions disabled");
        return Ok(result);
    }
    result.enabled = true;

    let tracker = tracker.ok_or_else(|| GoopsError::config("issue tracker is not configured"))?;
    for issue in issues.split_whitespace() {
        info!(issue, state, "transition issue");
        match tracker.transition(issue, state) {
            Ok(()) => result.transitioned.push(issue.to_string()),
            Err(e) => result.warnings.push(BoundaryWarning::IssueUpdateFailed {
                issue: issue.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::jira::{CreatedIssue, JiraVersion};
    use crate::release::ReleaseStrategy;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingTracker {
        calls: RefCell<Vec<String>>,
        failing_issue: Option<String>,
    }

    impl RecordingTracker {
        fn failing_on(issue: &str) -> Self {
            RecordingTracker {
                calls: RefCell::new(Vec::new()),
                failing_issue: Some(issue.to_string()),
            }
        }

        fn record(&self, call: String, issue: &str) -> Result<()> {
            self.calls.borrow_mut().push(call);
            if self.failing_issue.as_deref() == Some(issue) {
                return Err(GoopsError::http(format!("PUT /issue/{}: status 404", issue)));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl IssueTracker for RecordingTracker {
        fn assign_version(&self, issue: &str, version: &str) -> Result<()> {
            self.record(format!("assign {} {}", issue, version), issue)
        }

        fn ensure_version(&self, project: &str, version: &str) -> Result<JiraVersion> {
            self.record(format!("version {} {}", project, version), project)?;
            Ok(JiraVersion {
                id: "1".to_string(),
                name: version.to_string(),
                released: false,
            })
        }

        fn create_issue(
            &self,
            project: &str,
            issue: &DeploymentIssue,
            version: &str,
        ) -> Result<CreatedIssue> {
            self.record(format!("create {} {} {}", project, issue.summary, version), project)?;
            Ok(CreatedIssue {
                key: format!("{}-100", project),
            })
        }

        fn transition(&self, issue: &str, state: &str) -> Result<()> {
            self.record(format!("transition {} {}", issue, state), issue)
        }
    }

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.export.file = dir.path().join(".goops.env");
        config
    }

    fn jira_config(dir: &TempDir) -> Config {
        let mut config = config_in(dir);
        config.jira.enabled = true;
        config
    }

    #[test]
    fn test_version_workflow_prints_snapshot() {
        let dir = TempDir::new().unwrap();
        let repo = MockRepository::new().with_previous_tag("1.12.3");

        let result =
            run_version_workflow(&VersionWorkflowArgs::default(), &config_in(&dir), &repo).unwrap();

        assert_eq!(result.version, "1.13.0-SNAPSHOT");
        assert!(result.exported.is_empty());
        assert!(!dir.path().join(".goops.env").exists());
    }

    #[test]
    fn test_version_workflow_release_and_save() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("custom.env");
        let repo = MockRepository::new().with_previous_tag("1.12.3");
        let args = VersionWorkflowArgs {
            release: true,
            save: true,
            file: Some(file.clone()),
            strategy: None,
        };

        let result = run_version_workflow(&args, &config_in(&dir), &repo).unwrap();

        assert_eq!(result.version, "1.13.0");
        assert_eq!(
            fs::read_to_string(file).unwrap(),
            "export GOOPS_SEMVER=1.13.0-SNAPSHOT\n\
             export GOOPS_SEMVER_RELEASE=1.13.0\n\
             export GOOPS_SEMVER_MAJOR=1\n\
             export GOOPS_SEMVER_MINOR=13\n\
             export GOOPS_SEMVER_PATCH=0\n"
        );
        assert_eq!(result.exported.len(), 5);
    }

    #[test]
    fn test_version_workflow_strategy_override() {
        let dir = TempDir::new().unwrap();
        let repo = MockRepository::new()
            .on_branch("2.2-stable")
            .with_previous_tag("2.2.12");
        let args = VersionWorkflowArgs {
            strategy: Some("gitlab-flow".to_string()),
            ..VersionWorkflowArgs::default()
        };

        let result = run_version_workflow(&args, &config_in(&dir), &repo).unwrap();
        assert_eq!(result.version, "2.2.13-SNAPSHOT");

        let args = VersionWorkflowArgs {
            strategy: Some("nope".to_string()),
            ..VersionWorkflowArgs::default()
        };
        assert!(run_version_workflow(&args, &config_in(&dir), &repo).is_err());
    }

    #[test]
    fn test_setenv_semver_only() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.semver.strategy = ReleaseStrategy::GitlabFlow;
        let repo = MockRepository::new().with_previous_tag("1.12.3");

        let result = run_setenv_workflow::<_, RecordingTracker>(
            &SetenvWorkflowArgs::default(),
            &config,
            &repo,
            None,
        )
        .unwrap();

        assert_eq!(result.version.unwrap().snapshot, "1.13.0-SNAPSHOT");
        assert!(result.issues.is_empty());
        assert_eq!(result.exported.len(), 5);
    }

    #[test]
    fn test_setenv_without_export() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.semver.save_export = false;
        let repo = MockRepository::new();

        let result = run_setenv_workflow::<_, RecordingTracker>(
            &SetenvWorkflowArgs::default(),
            &config,
            &repo,
            None,
        )
        .unwrap();

        assert!(result.exported.is_empty());
        assert!(!config.export.file.exists());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_setenv_assigns_release_version() {
        let dir = TempDir::new().unwrap();
        let config = jira_config(&dir);
        let repo = MockRepository::new()
            .with_previous_tag("1.0.0")
            .with_commit_message("PROJ-1 PROJ-2 login");
        let tracker = RecordingTracker::default();

        let result =
            run_setenv_workflow(&SetenvWorkflowArgs::default(), &config, &repo, Some(&tracker))
                .unwrap();

        assert_eq!(result.issues, vec!["PROJ-1", "PROJ-2"]);
        assert_eq!(result.assigned, vec!["PROJ-1", "PROJ-2"]);
        assert_eq!(
            tracker.calls(),
            vec!["assign PROJ-1 1.1.0", "assign PROJ-2 1.1.0"]
        );
        let exported = fs::read_to_string(&config.export.file).unwrap();
        assert!(exported.ends_with("export GOOPS_JIRA_ISSUES=PROJ-1 PROJ-2\n"));
    }

    #[test]
    fn test_setenv_continues_after_issue_failure() {
        let dir = TempDir::new().unwrap();
        let config = jira_config(&dir);
        let repo = MockRepository::new()
            .with_previous_tag("1.0.0")
            .with_commit_message("PROJ-1 PROJ-2");
        let tracker = RecordingTracker::failing_on("PROJ-1");

        let result =
            run_setenv_workflow(&SetenvWorkflowArgs::default(), &config, &repo, Some(&tracker))
                .unwrap();

        assert_eq!(result.assigned, vec!["PROJ-2"]);
        assert!(result.warnings.iter().any(|w| matches!(
            w,
            BoundaryWarning::IssueUpdateFailed { issue, .. } if issue == "PROJ-1"
        )));
    }

    #[test]
    fn test_setenv_creates_versions_and_deployment_issue() {
        let dir = TempDir::new().unwrap();
        let mut config = jira_config(&dir);
        config.jira.version_create = true;
        config.jira.create_deployment_issue = true;
        let repo = MockRepository::new()
            .with_previous_tag("2.3.0")
            .with_commit_message("PROJ-7 OPS-1");
        let tracker = RecordingTracker::default();

        let result =
            run_setenv_workflow(&SetenvWorkflowArgs::default(), &config, &repo, Some(&tracker))
                .unwrap();

        assert_eq!(
            tracker.calls(),
            vec![
                "version OPS 2.4.0",
                "version PROJ 2.4.0",
                "assign PROJ-7 2.4.0",
                "assign OPS-1 2.4.0",
                "create PROJ Deployment 2.4.0 2.4.0",
            ]
        );
        assert_eq!(result.deployment_issue.as_deref(), Some("PROJ-100"));
    }

    #[test]
    fn test_setenv_assignment_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = jira_config(&dir);
        config.jira.version_assign = false;
        let repo = MockRepository::new().with_commit_message("PROJ-1");

        let result = run_setenv_workflow::<_, RecordingTracker>(
            &SetenvWorkflowArgs::default(),
            &config,
            &repo,
            None,
        )
        .unwrap();

        assert_eq!(result.issues, vec!["PROJ-1"]);
        assert!(result.assigned.is_empty());
    }

    #[test]
    fn test_setenv_requires_tracker_for_assignment() {
        let dir = TempDir::new().unwrap();
        let config = jira_config(&dir);
        let repo = MockRepository::new().with_commit_message("PROJ-1");

        let err = run_setenv_workflow::<_, RecordingTracker>(
            &SetenvWorkflowArgs::default(),
            &config,
            &repo,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GoopsError::Config(_)));
    }

    #[test]
    fn test_transition_workflow() {
        let dir = TempDir::new().unwrap();
        let config = jira_config(&dir);
        let tracker = RecordingTracker::failing_on("OPS-2");

        let result =
            run_transition_workflow("PROJ-1  OPS-2", "Done", &config, Some(&tracker)).unwrap();

        assert!(result.enabled);
        assert_eq!(result.transitioned, vec!["PROJ-1"]);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            tracker.calls(),
            vec!["transition PROJ-1 Done", "transition OPS-2 Done"]
        );
    }

    #[test]
    fn test_transition_workflow_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = jira_config(&dir);
        config.jira.issue_transition = false;
        let tracker = RecordingTracker::default();

        let result = run_transition_workflow("PROJ-1", "Done", &config, Some(&tracker)).unwrap();

        assert!(!result.enabled);
        assert!(tracker.calls().is_empty());
    }
}
