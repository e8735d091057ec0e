//! Output helpers for consistent CLI output.
//!
//! Colored status prefixes plus a spinner for long container operations.
//! Cosmetic only: nothing here affects scheduling or control flow.

use std::borrow::Cow;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

pub struct Output;

impl Output {
    /// `✓ Installed 3 packages`
    pub fn success(msg: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), msg.as_ref());
    }

    /// `✗ Failed to create container` (stderr)
    pub fn error(msg: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), msg.as_ref().red());
    }

    /// `⚠ Export skipped`
    pub fn warning(msg: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow(), msg.as_ref());
    }

    /// `→ Resolving stack...`
    pub fn info(msg: impl AsRef<str>) {
        println!("{} {}", "→".cyan(), msg.as_ref().dimmed());
    }

    /// `  → apx subsystems new --stack dev --name main`
    pub fn hint(msg: impl AsRef<str>) {
        println!("  {} {}", "→".cyan(), msg.as_ref());
    }

    /// `  vim`
    pub fn list_item(msg: impl AsRef<str>) {
        println!("  {}", msg.as_ref());
    }

    /// `Running: apt install -y vim` — every synthesized command is shown
    /// before it runs.
    pub fn running(cmd: impl AsRef<str>) {
        println!("{} {}", "Running:".dimmed(), cmd.as_ref().dimmed());
    }

    /// Spinner for blocking container operations.
    pub fn spinner(msg: impl Into<Cow<'static, str>>) -> Spinner {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .expect("valid template"),
        );
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(80));
        Spinner(pb)
    }
}

pub struct Spinner(ProgressBar);

impl Spinner {
    pub fn finish_success(self, msg: impl AsRef<str>) {
        self.0
            .finish_with_message(format!("{} {}", "✓".green().bold(), msg.as_ref()));
    }

    pub fn finish_error(self, msg: impl AsRef<str>) {
        self.0
            .finish_with_message(format!("{} {}", "✗".red().bold(), msg.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_methods_do_not_panic() {
        Output::success("test");
        Output::error("test");
        Output::warning("test");
        Output::info("test");
        Output::hint("test");
        Output::list_item("test");
        Output::running("test");
    }

    #[test]
    fn spinner_lifecycle() {
        let spinner = Output::spinner("working...");
        spinner.finish_success("done");
    }
}
