use crate::error::{GoopsError, Result};
use std::cell::RefCell;
use std::process::Command;
use tracing::info;

/// Runs external programs on behalf of goops
pub trait CommandRunner {
    /// Run `program` with `args`, failing unless it exits with status 0
    fn run(&self, program: &str, args: &[String]) -> Result<()>;
}

/// Render a command line for logs and error messages
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs commands with `std::process::Command`, output goes straight to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<()> {
        let line = command_line(program, args);
        info!(command = %line, "exec");

        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| GoopsError::command(format!("{}: {}", line, e)))?;

        if !status.success() {
            return Err(GoopsError::command(format!(
                "{} exited with code {}",
                line,
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}

/// Records command lines instead of running them
#[derive(Debug, Default)]
pub struct RecordingRunner {
    commands: RefCell<Vec<String>>,
    failing: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every command line starting with `prefix`
    pub fn failing_on(prefix: impl Into<String>) -> Self {
        RecordingRunner {
            commands: RefCell::new(Vec::new()),
            failing: Some(prefix.into()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<()> {
        let line = command_line(program, args);
        self.commands.borrow_mut().push(line.clone());

        match &self.failing {
            Some(prefix) if line.starts_with(prefix.as_str()) => Err(GoopsError::command(format!(
                "{} exited with code 1",
                line
            ))),
            _ => Ok(()),
        }
    }
}
