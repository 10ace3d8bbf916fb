//! Step progress for probe runs
//!
//! A spinner shows the step in flight; finished steps are printed above it
//! as they complete.

use indicatif::{MultiProgress, ProgressStyle};
use sp_core::{ProbeObserver, Step, StepOutcome};

use super::OutputConfig;
use super::render::render_step;

/// Progress spinner wrapper
///
/// Handles progress display based on output configuration.
/// In quiet or JSON mode, progress is suppressed.
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a spinner for indeterminate progress
    pub fn spinner(config: &OutputConfig, message: &str) -> Self {
        Self::build(config, None, message)
    }

    /// Create a spinner drawn as one line of a shared display
    pub fn spinner_in(config: &OutputConfig, multi: &MultiProgress, message: &str) -> Self {
        Self::build(config, Some(multi), message)
    }

    fn build(config: &OutputConfig, multi: Option<&MultiProgress>, message: &str) -> Self {
        if config.quiet || config.json || config.no_progress {
            return Self { bar: None };
        }

        let bar = indicatif::ProgressBar::new_spinner();
        let bar = match multi {
            Some(multi) => multi.add(bar),
            None => bar,
        };
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    /// Set message
    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Run `f` with the spinner hidden so plain prints don't tear it
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Check if progress bar is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

/// Observer that drives a spinner and optionally prints finished steps
pub struct StepProgress {
    label: String,
    spinner: ProgressBar,
    /// Print each finished step
    live: bool,
    colors: bool,
}

impl StepProgress {
    /// Spinner plus a printed line per finished step
    pub fn live(config: &OutputConfig, label: &str) -> Self {
        Self {
            label: label.to_string(),
            spinner: ProgressBar::spinner(config, label),
            live: !config.quiet && !config.json,
            colors: !config.no_color && !config.json,
        }
    }

    /// Spinner only, sharing a display with other runs
    pub fn quiet_in(config: &OutputConfig, multi: &MultiProgress, label: &str) -> Self {
        Self {
            label: label.to_string(),
            spinner: ProgressBar::spinner_in(config, multi, label),
            live: false,
            colors: false,
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProbeObserver for StepProgress {
    fn step_started(&mut self, step: Step) {
        self.spinner.set_message(&format!(
            "{}: [{}/{}] {}",
            self.label,
            step.number(),
            Step::ALL.len(),
            step.title()
        ));
    }

    fn step_finished(&mut self, outcome: &StepOutcome) {
        if self.live {
            let line = render_step(outcome, self.colors);
            self.spinner.suspend(|| println!("{line}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_quiet_mode() {
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        let bar = ProgressBar::spinner(&config, "probe");
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_spinner_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        let bar = ProgressBar::spinner(&config, "probe");
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_spinner_no_progress() {
        let config = OutputConfig {
            no_progress: true,
            ..Default::default()
        };
        let bar = ProgressBar::spinner(&config, "probe");
        assert!(!bar.is_visible());
        assert_eq!(bar.suspend(|| 7), 7);
    }

    #[test]
    fn test_spinner_normal() {
        let bar = ProgressBar::spinner(&OutputConfig::default(), "probe");
        assert!(bar.is_visible());
        bar.finish_and_clear();
    }

    #[test]
    fn test_step_progress_json_is_silent() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        let progress = StepProgress::live(&config, "legacy");
        assert!(!progress.live);
        assert!(!progress.spinner.is_visible());
    }
}
