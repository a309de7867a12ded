//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::recording::ButtonLabels;
use crate::domain::session::{SessionSnapshot, SessionState};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.print_err(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.print_err(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.print_err(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.print_err(format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout (the saved path, config values)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a snapshot as one JSON line on stdout
    pub fn snapshot_json(&self, snapshot: &SessionSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => self.warn(&format!("Could not serialize session state: {}", e)),
        }
    }

    /// Show the live recording status on the spinner
    pub fn recording_status(&self, snapshot: &SessionSnapshot, labels: &ButtonLabels) {
        self.update_spinner(&Self::format_status(snapshot, labels));
    }

    /// Format the status line: state, clock and the available controls
    pub fn format_status(snapshot: &SessionSnapshot, labels: &ButtonLabels) -> String {
        let clock = &snapshot.formatted_duration;
        match snapshot.state {
            SessionState::Recording => format!(
                "{} {}  [p] {}  [s] {}",
                "REC".red().bold(),
                clock,
                labels.pause(),
                labels.stop()
            ),
            SessionState::Paused => format!(
                "{} {}  [p] {}  [s] {}",
                "PAUSED".yellow().bold(),
                clock,
                labels.resume(),
                labels.stop()
            ),
            SessionState::Stopping => format!("Finalizing recording... {}", clock),
            SessionState::Idle => format!("{} {}", labels.start(), clock),
        }
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print to stderr without tearing the spinner
    fn print_err(&self, line: String) {
        match self.spinner {
            Some(ref spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
