//! Colored console output for scan results.

use crate::registry::ProbeObserver;
use crate::types::ScanReport;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use tracing::warn;

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    verbose: bool,
    json_mode: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new(verbose: bool, json_mode: bool) -> Self {
        Self { verbose, json_mode }
    }

    /// Print scan progress (only in verbose mode).
    pub fn print_progress(&self, message: &str) {
        if self.json_mode || !self.verbose {
            return;
        }

        println!("{} {}", "[.]".dimmed(), message.dimmed());
    }

    /// Print the final report, or the JSON document in JSON mode.
    pub fn print_report(&self, report: &ScanReport) {
        if self.json_mode {
            match serde_json::to_string_pretty(report) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Failed to serialize report: {}", e),
            }
            return;
        }

        println!();
        for line in render_report(report) {
            println!("{}", line);
        }
        if self.verbose {
            println!(
                "    {} candidates from {} in {:.2}s",
                report.candidates,
                report.source.dimmed(),
                report.duration_secs
            );
        }
    }

    /// Create a progress bar. Verbose runs print per-request lines instead.
    pub fn create_progress_bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if self.json_mode || self.verbose {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .ok()?
            .progress_chars("#>-");
        let pb = ProgressBar::new(total);
        pb.set_style(style);
        pb.set_message(message.to_string());
        Some(pb)
    }
}

impl ProbeObserver for ConsoleOutput {
    fn on_skip(&self, name: &str) {
        self.print_progress(&skip_line(name));
    }

    fn on_response(&self, _name: &str, url: &str, status: StatusCode) {
        self.print_progress(&format!("Checking: {} : {}", url, status.as_u16()));
    }

    fn on_error(&self, _name: &str, url: &str, error: &reqwest::Error) {
        if self.json_mode || !self.verbose {
            return;
        }
        println!("{}", error_line(url, error));
    }
}

fn skip_line(name: &str) -> String {
    format!("Skipping platform package: {}", name)
}

fn error_line(url: &str, error: &dyn std::fmt::Display) -> String {
    format!(" {} Error when trying to request {} : {}", "[W]".yellow(), url, error)
}

fn render_report(report: &ScanReport) -> Vec<String> {
    if !report.has_findings() {
        return vec![format!(
            "{} All packages seem to be available in the public repositories.",
            "[*]".bright_blue()
        )];
    }

    let mut lines = vec![format!(
        "{}",
        "Issues found, the following packages are not available in public package repositories:"
            .red()
            .bold()
    )];
    lines.extend(
        report
            .unavailable
            .iter()
            .map(|name| format!(" {} {}", "[!]".red(), name)),
    );
    lines
}
