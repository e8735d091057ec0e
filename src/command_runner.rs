//! Abstraction over subprocess execution.
//!
//! Every invocation of the container engine or the orchestration helper goes
//! through the [`CommandRunner`] trait. Production code uses
//! [`RealCommandRunner`]; unit tests swap in a mock that records calls and
//! replays canned outputs, so no test ever spawns a container engine.

use anyhow::{Context, Result};
use std::process::{Command, ExitStatus, Output, Stdio};

/// Trait for running external commands.
///
/// The two methods cover the adapter's needs:
/// - [`run_output`](CommandRunner::run_output): captures stdout + stderr
/// - [`run_status`](CommandRunner::run_status): inherits stdio (interactive)
pub trait CommandRunner: Send + Sync {
    /// Run a command and capture its full output.
    fn run_output(&self, program: &str, args: &[String], options: &CommandOptions)
    -> Result<Output>;

    /// Run a command with inherited stdio, returning only the exit status.
    fn run_status(
        &self,
        program: &str,
        args: &[String],
        options: &CommandOptions,
    ) -> Result<ExitStatus>;
}

/// Per-invocation execution options.
///
/// The `env` field carries variables that must be present on every call,
/// such as the engine-specific storage-driver variable.
#[derive(Debug, Default, Clone)]
pub struct CommandOptions {
    /// Additional environment variables.
    pub env: Vec<(String, String)>,
}

impl CommandOptions {
    /// Options with a single environment variable set.
    pub fn with_env(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            env: vec![(key.into(), value.into())],
        }
    }
}

/// Production implementation over [`std::process::Command`].
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run_output(
        &self,
        program: &str,
        args: &[String],
        options: &CommandOptions,
    ) -> Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());
        for (k, v) in &options.env {
            cmd.env(k, v);
        }
        cmd.output()
            .with_context(|| format!("Failed to run '{program}'"))
    }

    fn run_status(
        &self,
        program: &str,
        args: &[String],
        options: &CommandOptions,
    ) -> Result<ExitStatus> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        for (k, v) in &options.env {
            cmd.env(k, v);
        }
        cmd.status()
            .with_context(|| format!("Failed to run '{program}'"))
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockCommandRunner;
    use super::*;

    #[test]
    fn real_runner_captures_output() {
        let runner = RealCommandRunner;
        let output = runner
            .run_output("echo", &["hello".to_string()], &CommandOptions::default())
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn real_runner_passes_env() {
        let runner = RealCommandRunner;
        let output = runner
            .run_output(
                "sh",
                &["-c".to_string(), "echo $APX_TEST_VAR".to_string()],
                &CommandOptions::with_env("APX_TEST_VAR", "zfs"),
            )
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "zfs");
    }

    #[test]
    fn mock_runner_records_and_replays() {
        let mock = MockCommandRunner::new();
        mock.respond("podman", "ps -a", "abc123\n");

        let output = mock
            .run_output(
                "podman",
                &["ps".to_string(), "-a".to_string()],
                &CommandOptions::default(),
            )
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "abc123\n");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.calls()[0].line(), "podman ps -a");
    }

    #[test]
    fn mock_runner_unmatched_call_succeeds_empty() {
        let mock = MockCommandRunner::new();
        let output = mock
            .run_output("docker", &["info".to_string()], &CommandOptions::default())
            .unwrap();
        assert!(output.status.success());
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn mock_runner_failure_rule() {
        let mock = MockCommandRunner::new();
        mock.fail("podman", "create", 125, "image not found");
        let output = mock
            .run_output(
                "podman",
                &["create".to_string()],
                &CommandOptions::default(),
            )
            .unwrap();
        assert_eq!(output.status.code(), Some(125));
        assert_eq!(String::from_utf8_lossy(&output.stderr), "image not found");
    }
}
