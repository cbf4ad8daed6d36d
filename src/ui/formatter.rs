//! Pure formatting functions for UI output.
//!
//! `format_*` functions build the styled strings, `display_*` functions print them.
//! Diagnostics go to stderr; stdout carries only values other tools consume
//! (versions, issue keys, export lines).

use crate::boundary::BoundaryWarning;
use crate::release::ResolvedVersion;
use console::style;

pub fn format_error(message: &str) -> String {
    format!("{} {}", style("ERROR:").red().bold(), message)
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", style("✓").green(), message)
}

pub fn format_status(message: &str) -> String {
    format!("{} {}", style("→").yellow(), message)
}

pub fn format_boundary_warning(warning: &BoundaryWarning) -> String {
    format!("{} {}", style("⚠ WARNING:").yellow(), warning)
}

/// One line summary of a resolution, e.g. `1.13.0-SNAPSHOT (release 1.13.0, github-flow)`
pub fn format_resolved_version(resolved: &ResolvedVersion, strategy: &str) -> String {
    format!(
        "{} (release {}, {})",
        style(&resolved.snapshot).cyan().bold(),
        resolved.release,
        strategy
    )
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{}", format_error(message));
}

pub fn display_success(message: &str) {
    eprintln!("{}", format_success(message));
}

pub fn display_status(message: &str) {
    eprintln!("{}", format_status(message));
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{}", format_boundary_warning(warning));
}

pub fn display_resolved_version(resolved: &ResolvedVersion, strategy: &str) {
    eprintln!(
        "{} Version {}",
        style("→").yellow(),
        format_resolved_version(resolved, strategy)
    );
}

/// Echo an export line as it is written, unstyled so it can be copied into a shell
pub fn display_export_line(line: &str) {
    println!("{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    #[test]
    fn test_format_error() {
        plain();
        assert_eq!(format_error("boom"), "ERROR: boom");
    }

    #[test]
    fn test_format_status_and_success() {
        plain();
        assert_eq!(format_status("resolving"), "→ resolving");
        assert_eq!(format_success("done"), "✓ done");
    }

    #[test]
    fn test_format_boundary_warning() {
        plain();
        let warning = BoundaryWarning::NoPreviousTag {
            assumed: "0.0.0".to_string(),
        };
        assert_eq!(
            format_boundary_warning(&warning),
            "⚠ WARNING: No previous tag found, starting from 0.0.0"
        );
    }

    #[test]
    fn test_format_resolved_version() {
        plain();
        let resolved = ResolvedVersion {
            snapshot: "1.13.0-SNAPSHOT".to_string(),
            release: "1.13.0".to_string(),
            major: 1,
            minor: 13,
            patch: 0,
            warnings: Vec::new(),
        };
        assert_eq!(
            format_resolved_version(&resolved, "gitlab-flow"),
            "1.13.0-SNAPSHOT (release 1.13.0, gitlab-flow)"
        );
    }
}
