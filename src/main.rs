use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use goops::cli::{
    run_setenv_workflow, run_transition_workflow, run_version_workflow, SetenvWorkflowArgs,
    VersionWorkflowArgs,
};
use goops::config::{self, Config};
use goops::docker::{Docker, PublishDecision};
use goops::exec::SystemRunner;
use goops::git::Git2Repository;
use goops::issues::collect_issue_keys;
use goops::jira::{DeploymentIssue, JiraClient};
use goops::ui;

#[derive(Parser)]
#[command(
    name = "goops",
    version,
    about = "Semantic versions, issue keys and docker publishing for CI pipelines"
)]
struct Args {
    #[arg(long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv, -vvv)")]
    verbose: u8,

    #[arg(long, global = true, help = "Disable ANSI color output")]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the semantic version of the current HEAD
    #[command(visible_alias = "v")]
    Version {
        #[arg(short, long, help = "Print the release version (without -SNAPSHOT)")]
        release: bool,

        #[arg(short, long, help = "Append the version variables to the export file")]
        save: bool,

        #[arg(short, long, help = "Export file, overrides the configured one")]
        file: Option<PathBuf>,

        #[arg(long, help = "Release strategy: github-flow, gitlab-flow or git-flow-branch")]
        strategy: Option<String>,
    },

    /// List issue keys of the current change, one per line
    #[command(visible_alias = "i")]
    Issues,

    /// Export version and issue variables and assign the version to the issues
    #[command(visible_alias = "s")]
    Setenv {
        #[arg(long, default_value = "", help = "Deployment issue summary")]
        summary: String,

        #[arg(long, default_value = "", help = "Deployment issue description")]
        description: String,

        #[arg(long, default_value = "", help = "Deployment issue type")]
        issue_type: String,
    },

    /// Move space separated issues to a workflow state
    Transition {
        #[arg(help = "Issue keys separated by spaces")]
        issues: String,

        #[arg(help = "Target state or transition name")]
        state: String,
    },

    /// Build and publish docker images
    #[command(subcommand)]
    Docker(DockerCommand),
}

#[derive(Subcommand)]
enum DockerCommand {
    /// Build a docker image
    #[command(visible_alias = "b")]
    Build {
        #[arg(help = "Build context")]
        path: String,

        #[arg(short, long, help = "Name and optionally a tag in the 'name:tag' format")]
        tag: String,

        #[arg(short, long, help = "Name of the Dockerfile")]
        file: Option<String>,
    },

    /// Push an image when building master, a stable branch or a tag
    #[command(visible_alias = "p")]
    Push {
        #[arg(help = "Name and tag in the 'name:tag' format")]
        tag: String,
    },
}

fn main() {
    let args = Args::parse();
    ui::set_colors(!args.no_color && std::env::var_os("NO_COLOR").is_none());
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Console logging on stderr; RUST_LOG wins over -v
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = config::load(args.config.as_deref(), |name| std::env::var(name).ok())
        .context("Error loading config")?;

    match args.command {
        Command::Version {
            release,
            save,
            file,
            strategy,
        } => {
            let repo = open_repository()?;
            let workflow_args = VersionWorkflowArgs {
                release,
                save,
                file,
                strategy,
            };
            let result = run_version_workflow(&workflow_args, &config, &repo)?;
            for warning in &result.resolved.warnings {
                ui::display_boundary_warning(warning);
            }
            println!("{}", result.version);
        }
        Command::Issues => {
            let repo = open_repository()?;
            for key in collect_issue_keys(&config, &repo)? {
                println!("{}", key);
            }
        }
        Command::Setenv {
            summary,
            description,
            issue_type,
        } => {
            let repo = open_repository()?;
            let tracker = jira_client(&config, config.jira.version_assign)?;
            let workflow_args = SetenvWorkflowArgs {
                deployment: DeploymentIssue {
                    summary,
                    description,
                    issue_type,
                },
            };

            let result = run_setenv_workflow(&workflow_args, &config, &repo, tracker.as_ref())?;
            for line in &result.exported {
                ui::display_export_line(line);
            }
            for warning in &result.warnings {
                ui::display_boundary_warning(warning);
            }
            if let Some(version) = &result.version {
                ui::display_resolved_version(version, config.semver.strategy.name());
            }
            if !result.assigned.is_empty() {
                ui::display_success(&format!(
                    "Assigned {} to {}",
                    result
                        .version
                        .as_ref()
                        .map(|v| v.release.as_str())
                        .unwrap_or_default(),
                    result.assigned.join(", ")
                ));
            }
            if let Some(key) = &result.deployment_issue {
                ui::display_success(&format!("Created deployment issue {}", key));
            }
        }
        Command::Transition { issues, state } => {
            let tracker = jira_client(&config, config.jira.issue_transition)?;
            let result = run_transition_workflow(&issues, &state, &config, tracker.as_ref())?;
            for warning in &result.warnings {
                ui::display_boundary_warning(warning);
            }
            if !result.transitioned.is_empty() {
                ui::display_success(&format!(
                    "Moved {} to {}",
                    result.transitioned.join(", "),
                    state
                ));
            }
        }
        Command::Docker(DockerCommand::Build { path, tag, file }) => {
            let dockerfile = file.unwrap_or_else(|| config.docker.dockerfile.clone());
            Docker::new(&SystemRunner)
                .build(&tag, &dockerfile, &path)
                .with_context(|| format!("Failed to build {}", tag))?;
            ui::display_success(&format!("Built {}", tag));
        }
        Command::Docker(DockerCommand::Push { tag }) => {
            let decision = Docker::new(&SystemRunner)
                .push(&tag, &config.ci)
                .with_context(|| format!("Failed to push {}", tag))?;
            match decision {
                PublishDecision::Skip => ui::display_status("Docker publish skipped"),
                _ => ui::display_success(&format!("Pushed {}", tag)),
            }
        }
    }

    Ok(())
}

fn open_repository() -> Result<Git2Repository> {
    Git2Repository::open(".").context("Git repository error")
}

/// Jira client when issue tracking and the given feature are enabled
fn jira_client(config: &Config, feature_enabled: bool) -> Result<Option<JiraClient>> {
    if !config.jira.enabled || !feature_enabled {
        return Ok(None);
    }
    Ok(Some(JiraClient::from_config(config)?))
}
