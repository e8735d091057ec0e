//! Container engine and orchestration helper adapter.
//!
//! This is the only module allowed to invoke the container engine binary
//! (`podman`/`docker`) or the orchestration helper (`distrobox`). Everything
//! else describes *what* should happen; this module owns *how* the argv is
//! shaped for each backend.
//!
//! Root-full execution is asymmetric on purpose: engine-native subcommands
//! are re-entered through `sudo` (some engines have no native root flag),
//! while helper subcommands use the helper's own `--root` flag.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Output;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::command_runner::{CommandOptions, CommandRunner};
use crate::error::{Error, Result};

/// Orchestration helper binary.
pub const HELPER: &str = "distrobox";
/// Tool run inside a container to export apps and binaries to the host.
const HELPER_EXPORT: &str = "distrobox-export";
const SUDO: &str = "sudo";

/// Discovery label carried by every container this tool creates.
pub const LABEL_MANAGER: &str = "manager";
/// Literal manager identity; part of the on-engine compatibility surface.
pub const MANAGER_ID: &str = "apx";
/// Newer discovery marker; containers without it predate the label scheme.
pub const LABEL_MANAGED: &str = "apx.managed";
pub const LABEL_STACK: &str = "stack";
pub const LABEL_NAME: &str = "name";

/// Exit status of an interactive session ended by Ctrl-C.
const INTERRUPT_EXIT_CODE: i32 = 130;

/// Supported container engines, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Podman,
    Docker,
}

impl Engine {
    pub fn binary(self) -> &'static str {
        match self {
            Engine::Podman => "podman",
            Engine::Docker => "docker",
        }
    }

    /// Engine-specific storage driver variable, set on every invocation.
    pub fn storage_env(self) -> &'static str {
        match self {
            Engine::Podman => "CONTAINER_STORAGE_DRIVER",
            Engine::Docker => "DOCKER_STORAGE_DRIVER",
        }
    }
}

/// How a command's output is handled. The three modes are mutually
/// exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Capture stdout and return it; nothing reaches the terminal.
    Capture,
    /// Suppress stdout and stderr entirely.
    Mute,
    /// Connect stdio to the terminal (interactive use).
    #[default]
    Passthrough,
}

/// Flags for container creation.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub init: bool,
    pub rootful: bool,
    pub unshare_all: bool,
    /// Extra engine flags, passed through the helper verbatim.
    pub extra_flags: Vec<String>,
}

/// One row of an engine container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: String,
    pub created: String,
    pub status: String,
    pub labels: BTreeMap<String, String>,
    pub name: String,
}

/// Result of a best-effort export operation. A skip is logged, never
/// propagated as a failure of the surrounding operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed,
    Skipped(String),
}

impl ExportOutcome {
    pub fn completed(&self) -> bool {
        matches!(self, ExportOutcome::Completed)
    }
}

/// What to export from a container: a desktop application or a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    App(String),
    Bin(String),
}

impl ExportTarget {
    /// Build a target from the two optional CLI flags; exactly one must be
    /// present. Validated before any subprocess is spawned.
    pub fn from_flags(app: Option<String>, bin: Option<String>) -> Result<Self> {
        match (app, bin) {
            (Some(app), None) => Ok(ExportTarget::App(app)),
            (None, Some(bin)) => Ok(ExportTarget::Bin(bin)),
            _ => Err(Error::AmbiguousExportTarget),
        }
    }

    fn flag(&self) -> &'static str {
        match self {
            ExportTarget::App(_) => "--app",
            ExportTarget::Bin(_) => "--bin",
        }
    }

    fn value(&self) -> &str {
        match self {
            ExportTarget::App(v) | ExportTarget::Bin(v) => v,
        }
    }
}

/// The adapter owning all engine and helper interaction.
pub struct ContainerRuntime {
    engine: Engine,
    runner: Arc<dyn CommandRunner>,
    storage_driver: Option<String>,
    nvidia: bool,
}

impl ContainerRuntime {
    /// Probe for an engine, preferring podman and falling back to docker.
    ///
    /// Callers treat [`Error::EngineNotFound`] as fatal: there is no
    /// supported "no engine" mode.
    pub fn probe(runner: Arc<dyn CommandRunner>, storage_driver: Option<String>) -> Result<Self> {
        for engine in [Engine::Podman, Engine::Docker] {
            let probe = runner.run_output(
                engine.binary(),
                &["--version".to_string()],
                &CommandOptions::default(),
            );
            if matches!(probe, Ok(output) if output.status.success()) {
                debug!("using container engine '{}'", engine.binary());
                return Ok(Self {
                    engine,
                    runner,
                    storage_driver,
                    nvidia: nvidia_device_present(),
                });
            }
        }
        Err(Error::EngineNotFound)
    }

    /// Construct against a known engine (tests).
    pub fn with_engine(
        engine: Engine,
        runner: Arc<dyn CommandRunner>,
        storage_driver: Option<String>,
        nvidia: bool,
    ) -> Self {
        Self {
            engine,
            runner,
            storage_driver,
            nvidia,
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    fn options(&self) -> CommandOptions {
        match &self.storage_driver {
            Some(driver) => CommandOptions::with_env(self.engine.storage_env(), driver.clone()),
            None => CommandOptions::default(),
        }
    }

    /// Entry point for engine-native subcommands. Root-full runs go
    /// through the escalation wrapper.
    fn engine_invocation(&self, rootful: bool, args: Vec<String>) -> (String, Vec<String>) {
        if rootful {
            let mut wrapped = vec![self.engine.binary().to_string()];
            wrapped.extend(args);
            (SUDO.to_string(), wrapped)
        } else {
            (self.engine.binary().to_string(), args)
        }
    }

    fn run_engine(&self, rootful: bool, args: Vec<String>) -> Result<Output> {
        let (program, args) = self.engine_invocation(rootful, args);
        self.runner
            .run_output(&program, &args, &self.options())
            .map_err(|err| Error::Exec {
                name: program,
                detail: err.to_string(),
            })
    }

    /// Create a container named `name` from `image`, installing
    /// `packages` and attaching `labels` plus the discovery labels.
    pub fn create(
        &self,
        name: &str,
        image: &str,
        packages: &[String],
        labels: &[(String, String)],
        opts: &CreateOptions,
    ) -> Result<()> {
        let mut args = vec![
            "create".to_string(),
            "--name".to_string(),
            name.to_string(),
            "--image".to_string(),
            image.to_string(),
            "--yes".to_string(),
        ];
        if !packages.is_empty() {
            args.push("--additional-packages".to_string());
            args.push(packages.join(" "));
        }
        if opts.init {
            args.push("--init".to_string());
        }
        if opts.rootful {
            args.push("--root".to_string());
        }
        if opts.unshare_all {
            args.push("--unshare-all".to_string());
        }
        if self.nvidia {
            args.push("--nvidia".to_string());
        }

        let mut flags: Vec<String> = Vec::new();
        let mut label_keys: Vec<&str> = Vec::new();
        for (key, value) in labels {
            label_keys.push(key.as_str());
            flags.push(format!("--label={key}={value}"));
        }
        if !label_keys.contains(&LABEL_MANAGER) {
            flags.push(format!("--label={LABEL_MANAGER}={MANAGER_ID}"));
        }
        if !label_keys.contains(&LABEL_MANAGED) {
            flags.push(format!("--label={LABEL_MANAGED}=true"));
        }
        flags.extend(opts.extra_flags.iter().cloned());
        args.push("--additional-flags".to_string());
        args.push(flags.join(" "));

        let output = self
            .runner
            .run_output(HELPER, &args, &self.options())
            .map_err(|err| Error::Creation {
                name: name.to_string(),
                detail: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(Error::Creation {
                name: name.to_string(),
                detail: failure_detail(&output),
            });
        }
        Ok(())
    }

    /// Run `command` inside the container `name`.
    ///
    /// Returns the captured stdout in [`OutputMode::Capture`], `None`
    /// otherwise.
    pub fn exec(
        &self,
        name: &str,
        command: &[String],
        mode: OutputMode,
        rootful: bool,
    ) -> Result<Option<String>> {
        let mut args = vec!["enter".to_string(), name.to_string()];
        if rootful {
            args.push("--root".to_string());
        }
        args.push("--".to_string());
        args.extend(command.iter().cloned());

        match mode {
            OutputMode::Capture | OutputMode::Mute => {
                let output = self
                    .runner
                    .run_output(HELPER, &args, &self.options())
                    .map_err(|err| exec_error(name, err.to_string()))?;
                if !output.status.success() {
                    return Err(exec_error(name, failure_detail(&output)));
                }
                match mode {
                    OutputMode::Capture => {
                        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
                    }
                    _ => Ok(None),
                }
            }
            OutputMode::Passthrough => {
                let status = self
                    .runner
                    .run_status(HELPER, &args, &self.options())
                    .map_err(|err| exec_error(name, err.to_string()))?;
                if !status.success() {
                    return Err(exec_error(
                        name,
                        format!("exit status {}", status.code().unwrap_or(-1)),
                    ));
                }
                Ok(None)
            }
        }
    }

    /// Attach an interactive session to the container `name`.
    ///
    /// A Ctrl-C that ends the session is a normal way to leave it, not an
    /// error.
    pub fn enter(&self, name: &str, rootful: bool) -> Result<()> {
        let mut args = vec!["enter".to_string(), name.to_string()];
        if rootful {
            args.push("--root".to_string());
        }
        let status = self
            .runner
            .run_status(HELPER, &args, &self.options())
            .map_err(|err| exec_error(name, err.to_string()))?;
        if status.success() || status.code() == Some(INTERRUPT_EXIT_CODE) {
            Ok(())
        } else {
            Err(exec_error(
                name,
                format!("exit status {}", status.code().unwrap_or(-1)),
            ))
        }
    }

    pub fn start(&self, name: &str, rootful: bool) -> Result<()> {
        let output = self.run_engine(rootful, vec!["start".to_string(), name.to_string()])?;
        if !output.status.success() {
            return Err(exec_error(name, failure_detail(&output)));
        }
        Ok(())
    }

    pub fn stop(&self, name: &str, rootful: bool) -> Result<()> {
        let output = self.run_engine(rootful, vec!["stop".to_string(), name.to_string()])?;
        if !output.status.success() {
            return Err(exec_error(name, failure_detail(&output)));
        }
        Ok(())
    }

    /// List all containers carrying the manager label.
    ///
    /// Rows that do not split into the expected field count are skipped;
    /// a partially readable listing is better than none.
    pub fn list(&self, rootful: bool) -> Result<Vec<ContainerRecord>> {
        let args = vec![
            "ps".to_string(),
            "-a".to_string(),
            "--filter".to_string(),
            format!("label={LABEL_MANAGER}={MANAGER_ID}"),
            "--format".to_string(),
            "{{.ID}}|{{.CreatedAt}}|{{.Status}}|{{.Labels}}|{{.Names}}".to_string(),
        ];
        let output = self.run_engine(rootful, args)?;
        if !output.status.success() {
            return Err(exec_error(self.engine.binary(), failure_detail(&output)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut records = Vec::new();
        for line in stdout.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('|').collect();
            if fields.len() != 5 {
                continue;
            }
            records.push(ContainerRecord {
                id: fields[0].to_string(),
                created: fields[1].to_string(),
                status: fields[2].to_string(),
                labels: parse_label_map(fields[3]),
                name: fields[4].to_string(),
            });
        }
        Ok(records)
    }

    /// IDs of all containers matching an engine filter expression.
    pub fn container_ids(&self, filter: &str, rootful: bool) -> Result<Vec<String>> {
        let args = vec![
            "ps".to_string(),
            "-a".to_string(),
            "-q".to_string(),
            "-f".to_string(),
            filter.to_string(),
        ];
        let output = self.run_engine(rootful, args)?;
        if !output.status.success() {
            return Err(exec_error(self.engine.binary(), failure_detail(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn exists(&self, name: &str, rootful: bool) -> Result<bool> {
        let ids = self.container_ids(&format!("name=^{name}$"), rootful)?;
        Ok(!ids.is_empty())
    }

    /// Force-remove the container `name`. Removing a container that does
    /// not exist is not an error.
    pub fn remove(&self, name: &str, rootful: bool) -> Result<()> {
        if !self.exists(name, rootful)? {
            return Ok(());
        }
        let output = self.run_engine(
            rootful,
            vec![
                "rm".to_string(),
                "--force".to_string(),
                name.to_string(),
            ],
        )?;
        if !output.status.success() {
            return Err(exec_error(name, failure_detail(&output)));
        }
        Ok(())
    }

    /// Export a desktop application or binary from the container to the
    /// host. Best-effort: a failure is logged and reported as a skip.
    pub fn export(&self, name: &str, target: &ExportTarget, rootful: bool) -> ExportOutcome {
        self.run_export(name, target, rootful, false)
    }

    /// Undo an export. Same best-effort policy as [`export`](Self::export).
    pub fn unexport(&self, name: &str, target: &ExportTarget, rootful: bool) -> ExportOutcome {
        self.run_export(name, target, rootful, true)
    }

    fn run_export(
        &self,
        name: &str,
        target: &ExportTarget,
        rootful: bool,
        delete: bool,
    ) -> ExportOutcome {
        let mut args = vec!["enter".to_string(), name.to_string()];
        if rootful {
            args.push("--root".to_string());
        }
        args.push("--".to_string());
        args.push(HELPER_EXPORT.to_string());
        args.push(target.flag().to_string());
        args.push(target.value().to_string());
        if delete {
            args.push("--delete".to_string());
        }

        let result = self.runner.run_output(HELPER, &args, &self.options());
        let reason = match result {
            Ok(output) if output.status.success() => return ExportOutcome::Completed,
            Ok(output) => failure_detail(&output),
            Err(err) => err.to_string(),
        };
        warn!(
            "export of {} '{}' from '{}' did not complete: {}",
            match target {
                ExportTarget::App(_) => "application",
                ExportTarget::Bin(_) => "binary",
            },
            target.value(),
            name,
            reason
        );
        ExportOutcome::Skipped(reason)
    }
}

fn exec_error(name: &str, detail: String) -> Error {
    Error::Exec {
        name: name.to_string(),
        detail,
    }
}

/// Combine stderr and stdout of a failed invocation into one message.
fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = stderr.trim();
    let stdout = stdout.trim();
    let mut detail = String::new();
    if !stderr.is_empty() {
        detail.push_str(stderr);
    }
    if !stdout.is_empty() {
        if !detail.is_empty() {
            detail.push('\n');
        }
        detail.push_str(stdout);
    }
    if detail.is_empty() {
        detail.push_str("(no output)");
    }
    detail
}

/// Parse the textual label column of an engine listing.
///
/// Podman renders labels as `map[key:value key:value]`, docker as
/// `key=value,key=value`; both are accepted.
fn parse_label_map(raw: &str) -> BTreeMap<String, String> {
    let raw = raw.trim();
    let mut labels = BTreeMap::new();
    if let Some(inner) = raw.strip_prefix("map[").and_then(|r| r.strip_suffix(']')) {
        for pair in inner.split_whitespace() {
            if let Some((key, value)) = pair.split_once(':') {
                labels.insert(key.to_string(), value.to_string());
            }
        }
    } else {
        for pair in raw.split(',') {
            if let Some((key, value)) = pair.split_once('=') {
                labels.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }
    labels
}

/// Whether the host exposes an NVIDIA device node.
fn nvidia_device_present() -> bool {
    Path::new("/dev/nvidiactl").exists() || Path::new("/dev/nvidia0").exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::mock::MockCommandRunner;

    fn runtime_with(mock: Arc<MockCommandRunner>) -> ContainerRuntime {
        ContainerRuntime::with_engine(Engine::Podman, mock, None, false)
    }

    #[test]
    fn probe_prefers_podman() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond("podman", "--version", "podman version 5.0.0\n");
        mock.respond("docker", "--version", "Docker version 27.0\n");
        let runtime = ContainerRuntime::probe(mock, None).unwrap();
        assert_eq!(runtime.engine(), Engine::Podman);
    }

    #[test]
    fn probe_falls_back_to_docker() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.fail("podman", "--version", 127, "not found");
        mock.respond("docker", "--version", "Docker version 27.0\n");
        let runtime = ContainerRuntime::probe(mock, None).unwrap();
        assert_eq!(runtime.engine(), Engine::Docker);
    }

    #[test]
    fn probe_without_engine_is_fatal() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.fail("podman", "--version", 127, "not found");
        mock.fail("docker", "--version", 127, "not found");
        assert!(matches!(
            ContainerRuntime::probe(mock, None),
            Err(Error::EngineNotFound)
        ));
    }

    #[test]
    fn create_shapes_helper_argv_with_labels() {
        let mock = Arc::new(MockCommandRunner::new());
        let runtime = runtime_with(mock.clone());
        runtime
            .create(
                "apx-dev-main",
                "docker.io/library/ubuntu:latest",
                &["git".to_string(), "curl".to_string()],
                &[
                    ("stack".to_string(), "dev".to_string()),
                    ("name".to_string(), "main".to_string()),
                ],
                &CreateOptions {
                    init: true,
                    ..Default::default()
                },
            )
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.program, HELPER);
        let line = call.line();
        assert!(line.contains("create --name apx-dev-main"));
        assert!(line.contains("--image docker.io/library/ubuntu:latest"));
        assert!(line.contains("--yes"));
        assert!(line.contains("--additional-packages"));
        assert!(line.contains("git curl"));
        assert!(line.contains("--init"));
        let flags = call.args.last().unwrap();
        assert!(flags.contains("--label=stack=dev"));
        assert!(flags.contains("--label=name=main"));
        assert!(flags.contains("--label=manager=apx"));
        assert!(flags.contains("--label=apx.managed=true"));
    }

    #[test]
    fn create_failure_wraps_stderr() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.fail(HELPER, "create", 1, "image pull failed");
        let runtime = runtime_with(mock);
        let err = runtime
            .create("apx-dev-main", "bad:image", &[], &[], &CreateOptions::default())
            .unwrap_err();
        match err {
            Error::Creation { name, detail } => {
                assert_eq!(name, "apx-dev-main");
                assert!(detail.contains("image pull failed"));
            }
            other => panic!("expected Creation, got {other:?}"),
        }
    }

    #[test]
    fn rootful_create_uses_helper_root_flag() {
        let mock = Arc::new(MockCommandRunner::new());
        let runtime = runtime_with(mock.clone());
        runtime
            .create(
                "apx-dev-main",
                "img",
                &[],
                &[],
                &CreateOptions {
                    rootful: true,
                    ..Default::default()
                },
            )
            .unwrap();
        let call = &mock.calls()[0];
        assert_eq!(call.program, HELPER);
        assert!(call.args.contains(&"--root".to_string()));
    }

    #[test]
    fn rootful_engine_commands_go_through_sudo() {
        let mock = Arc::new(MockCommandRunner::new());
        let runtime = runtime_with(mock.clone());
        runtime.start("apx-dev-main", true).unwrap();
        let call = &mock.calls()[0];
        assert_eq!(call.program, "sudo");
        assert_eq!(call.args[0], "podman");
        assert_eq!(call.args[1], "start");
    }

    #[test]
    fn nvidia_host_adds_gpu_flag() {
        let mock = Arc::new(MockCommandRunner::new());
        let runtime = ContainerRuntime::with_engine(Engine::Podman, mock.clone(), None, true);
        runtime
            .create("apx-dev-main", "img", &[], &[], &CreateOptions::default())
            .unwrap();
        assert!(mock.calls()[0].args.contains(&"--nvidia".to_string()));
    }

    #[test]
    fn storage_driver_env_set_on_every_invocation() {
        let mock = Arc::new(MockCommandRunner::new());
        let runtime = ContainerRuntime::with_engine(
            Engine::Docker,
            mock.clone(),
            Some("btrfs".to_string()),
            false,
        );
        runtime.list(false).unwrap();
        runtime
            .create("c", "img", &[], &[], &CreateOptions::default())
            .unwrap();
        for call in mock.calls() {
            assert!(
                call.env
                    .contains(&("DOCKER_STORAGE_DRIVER".to_string(), "btrfs".to_string())),
                "missing storage env on: {}",
                call.line()
            );
        }
    }

    #[test]
    fn exec_capture_returns_stdout() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond(HELPER, "enter box -- ls", "a\nb\n");
        let runtime = runtime_with(mock);
        let out = runtime
            .exec("box", &["ls".to_string()], OutputMode::Capture, false)
            .unwrap();
        assert_eq!(out.as_deref(), Some("a\nb\n"));
    }

    #[test]
    fn exec_mute_returns_nothing() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond(HELPER, "enter box", "noise");
        let runtime = runtime_with(mock);
        let out = runtime
            .exec("box", &["ls".to_string()], OutputMode::Mute, false)
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn exec_failure_carries_stderr() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.fail(HELPER, "enter box", 1, "no such container");
        let runtime = runtime_with(mock);
        let err = runtime
            .exec("box", &["ls".to_string()], OutputMode::Capture, false)
            .unwrap_err();
        match err {
            Error::Exec { name, detail } => {
                assert_eq!(name, "box");
                assert!(detail.contains("no such container"));
            }
            other => panic!("expected Exec, got {other:?}"),
        }
    }

    #[test]
    fn rootful_exec_uses_helper_root_flag() {
        let mock = Arc::new(MockCommandRunner::new());
        let runtime = runtime_with(mock.clone());
        runtime
            .exec("box", &["id".to_string()], OutputMode::Mute, true)
            .unwrap();
        let call = &mock.calls()[0];
        assert_eq!(call.program, HELPER);
        let sep = call.args.iter().position(|a| a == "--").unwrap();
        assert!(call.args[..sep].contains(&"--root".to_string()));
    }

    #[test]
    fn enter_treats_interrupt_exit_as_success() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.fail(HELPER, "enter box", INTERRUPT_EXIT_CODE, "");
        let runtime = runtime_with(mock);
        assert!(runtime.enter("box", false).is_ok());
    }

    #[test]
    fn enter_propagates_other_failures() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.fail(HELPER, "enter box", 127, "");
        let runtime = runtime_with(mock);
        assert!(runtime.enter("box", false).is_err());
    }

    #[test]
    fn list_parses_podman_label_maps() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond(
            "podman",
            "ps -a --filter",
            "abc|2 days ago|Up 3 hours|map[manager:apx stack:dev name:main]|apx-dev-main\n",
        );
        let runtime = runtime_with(mock);
        let records = runtime.list(false).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "abc");
        assert_eq!(record.name, "apx-dev-main");
        assert_eq!(record.labels.get("stack").map(String::as_str), Some("dev"));
        assert_eq!(record.labels.get("name").map(String::as_str), Some("main"));
    }

    #[test]
    fn list_parses_docker_label_lists() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond(
            "podman",
            "ps -a --filter",
            "abc|2024|Exited|manager=apx,stack=dev,name=main|apx-dev-main\n",
        );
        let runtime = runtime_with(mock);
        let records = runtime.list(false).unwrap();
        assert_eq!(
            records[0].labels.get("manager").map(String::as_str),
            Some("apx")
        );
    }

    #[test]
    fn list_skips_malformed_rows() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond(
            "podman",
            "ps -a --filter",
            "only|three|fields\n\
             abc|2024|Up|map[manager:apx name:x stack:s]|apx-s-x\n\
             \n",
        );
        let runtime = runtime_with(mock);
        let records = runtime.list(false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "abc");
    }

    #[test]
    fn remove_is_idempotent_for_missing_containers() {
        let mock = Arc::new(MockCommandRunner::new());
        // Existence query returns no ids; no `rm` must follow.
        let runtime = runtime_with(mock.clone());
        runtime.remove("ghost", false).unwrap();
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].line().contains("ps -a -q"));
    }

    #[test]
    fn remove_forces_when_container_exists() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond("podman", "name=^box$", "deadbeef\n");
        let runtime = runtime_with(mock.clone());
        runtime.remove("box", false).unwrap();
        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].line().contains("rm --force box"));
    }

    #[test]
    fn export_failure_is_a_skip_not_an_error() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.fail(HELPER, "distrobox-export", 1, "no desktop file");
        let runtime = runtime_with(mock.clone());
        let outcome = runtime.export("box", &ExportTarget::App("gimp".to_string()), false);
        match outcome {
            ExportOutcome::Skipped(reason) => assert!(reason.contains("no desktop file")),
            other => panic!("expected Skipped, got {other:?}"),
        }
    }

    #[test]
    fn unexport_appends_delete_flag() {
        let mock = Arc::new(MockCommandRunner::new());
        let runtime = runtime_with(mock.clone());
        let outcome = runtime.unexport("box", &ExportTarget::Bin("node".to_string()), false);
        assert!(outcome.completed());
        let line = mock.calls()[0].line();
        assert!(line.contains("distrobox-export --bin node --delete"));
    }

    #[test]
    fn export_target_requires_exactly_one() {
        assert!(matches!(
            ExportTarget::from_flags(None, None),
            Err(Error::AmbiguousExportTarget)
        ));
        assert!(matches!(
            ExportTarget::from_flags(Some("a".into()), Some("b".into())),
            Err(Error::AmbiguousExportTarget)
        ));
        assert_eq!(
            ExportTarget::from_flags(Some("gimp".into()), None).unwrap(),
            ExportTarget::App("gimp".into())
        );
    }

    #[test]
    fn label_map_parser_handles_both_renderings() {
        let podman = parse_label_map("map[a:1 b:2]");
        assert_eq!(podman.get("a").map(String::as_str), Some("1"));
        assert_eq!(podman.get("b").map(String::as_str), Some("2"));

        let docker = parse_label_map("a=1,b=2");
        assert_eq!(docker, podman);

        assert!(parse_label_map("").is_empty());
        assert!(parse_label_map("map[]").is_empty());
    }
}
