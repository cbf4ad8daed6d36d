use crate::config::ExportConfig;
use crate::error::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Shell file that later pipeline stages `source` to recover exported variables.
///
/// Lines are appended and never rewritten, so the last assignment of a name wins
/// when the file is sourced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    path: PathBuf,
    prefix: String,
}

impl ExportFile {
    pub fn new(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        ExportFile {
            path: path.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        ExportFile::new(config.file.clone(), config.prefix.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `export {prefix}{name}={value}`
    pub fn line(&self, name: &str, value: &str) -> String {
        format!("export {}{}={}", self.prefix, name, value)
    }

    /// Append one variable, creating the file when needed. Returns the written line.
    pub fn append(&self, name: &str, value: &str) -> Result<String> {
        let mut lines = self.append_all(&[(name, value.to_string())])?;
        Ok(lines.remove(0))
    }

    /// Append several variables in order. Returns the written lines.
    pub fn append_all<N: AsRef<str>>(&self, vars: &[(N, String)]) -> Result<Vec<String>> {
        let lines: Vec<String> = vars
            .iter()
            .map(|(name, value)| self.line(name.as_ref(), value))
            .collect();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for line in &lines {
            writeln!(file, "{}", line)?;
        }

        Ok(lines)
    }
}
