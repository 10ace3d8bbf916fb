//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both human-readable
//! and JSON formats. It also handles step spinners and colored output.

mod formatter;
mod progress;
pub mod render;

pub use formatter::Formatter;
pub use progress::{ProgressBar, StepProgress};

/// Output configuration derived from CLI flags and config defaults
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress spinner
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
    /// Color even when stdout is not a terminal
    pub force_color: bool,
}

impl OutputConfig {
    /// Fill in settings the flags left unset from the config file defaults
    pub fn with_defaults(mut self, defaults: &sp_core::config::Defaults) -> Self {
        self.json |= defaults.output == "json";
        self.no_color |= defaults.color == "never";
        self.force_color = !self.no_color && defaults.color == "always";
        self.no_progress |= !defaults.progress;
        self
    }

    /// Make `console` styling follow the configured color mode
    pub fn apply_color_mode(&self) {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        } else if self.force_color {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        }
    }
}
