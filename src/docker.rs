use crate::config::CiConfig;
use crate::error::Result;
use crate::exec::CommandRunner;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static STABLE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*-stable$").expect("valid stable ref regex"));

/// What a push publishes, decided from the CI ref
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDecision {
    Skip,
    /// Tagged build, also published as `:stable`
    Tagged,
    /// Untagged master build, also published as `:latest`
    Master,
    /// Stable branch build, only the given tag
    Stable,
}

impl PublishDecision {
    pub fn for_ci(ci: &CiConfig) -> PublishDecision {
        let ref_name = ci.ref_name.as_deref().unwrap_or_default();
        let is_tag = ci.commit_tag.as_deref().is_some_and(|tag| !tag.is_empty());

        if is_tag {
            PublishDecision::Tagged
        } else if ref_name == "master" {
            PublishDecision::Master
        } else if STABLE_REF.is_match(ref_name) {
            PublishDecision::Stable
        } else {
            PublishDecision::Skip
        }
    }
}

/// Image name of a tag: `registry:5000/app:1.2.0` is `registry:5000/app`
pub fn image_name(tag: &str) -> &str {
    match tag.rsplit_once(':') {
        Some((image, version)) if !version.contains('/') => image,
        _ => tag,
    }
}

pub struct Docker<'a, C: CommandRunner + ?Sized> {
    runner: &'a C,
}

impl<'a, C: CommandRunner + ?Sized> Docker<'a, C> {
    pub fn new(runner: &'a C) -> Self {
        Docker { runner }
    }

    fn docker(&self, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.runner.run("docker", &args)
    }

    /// `docker build [-f DOCKERFILE] [-t TAG] PATH`
    pub fn build(&self, tag: &str, dockerfile: &str, path: &str) -> Result<()> {
        let mut args = vec!["build"];
        if !dockerfile.is_empty() {
            args.extend(["-f", dockerfile]);
        }
        if !tag.is_empty() {
            args.extend(["-t", tag]);
        }
        args.push(path);
        self.docker(&args)
    }

    /// Publish `tag` when the build runs on master, a stable branch or a git tag
    pub fn push(&self, tag: &str, ci: &CiConfig) -> Result<PublishDecision> {
        let decision = PublishDecision::for_ci(ci);
        let image = image_name(tag);

        match decision {
            PublishDecision::Skip => {
                info!("Docker publish skipped");
                debug!(ref_name = ?ci.ref_name, commit_tag = ?ci.commit_tag, "not a publishing ref");
                return Ok(decision);
            }
            PublishDecision::Tagged => self.alias(tag, &format!("{}:stable", image))?,
            PublishDecision::Master => self.alias(tag, &format!("{}:latest", image))?,
            PublishDecision::Stable => {}
        }

        self.docker(&["push", tag])?;
        Ok(decision)
    }

    fn alias(&self, tag: &str, alias: &str) -> Result<()> {
        self.docker(&["tag", tag, alias])?;
        self.docker(&["push", alias])
    }
}
