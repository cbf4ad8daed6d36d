//! User facing output.
//!
//! goops runs unattended in CI, so there are no prompts; this module only owns
//! color handling and re-exports the formatter.

pub mod formatter;

pub use formatter::{
    display_boundary_warning, display_error, display_export_line, display_resolved_version,
    display_status, display_success,
};

/// Enable or disable ANSI styling on both output streams
pub fn set_colors(enabled: bool) {
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}
