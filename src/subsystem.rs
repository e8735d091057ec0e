//! Subsystems: named containers bound to a stack.
//!
//! A subsystem has no persisted record of its own — the container *is* the
//! record. Creation attaches discovery labels; discovery lists containers
//! carrying the manager label and rebuilds subsystem values from those
//! labels plus a stack registry lookup.

use tracing::warn;

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::runtime::{
    ContainerRuntime, CreateOptions, ExportOutcome, ExportTarget, LABEL_MANAGED, LABEL_MANAGER,
    LABEL_NAME, LABEL_STACK, MANAGER_ID, OutputMode,
};
use crate::stack::Stack;

#[derive(Debug, Clone)]
pub struct SubSystem {
    /// User-facing name.
    pub name: String,
    /// Owning stack, shared and read-only from here.
    pub stack: Stack,
    /// Engine-reported status; re-read on every discovery, never stored.
    pub status: String,
}

impl SubSystem {
    pub fn new(name: impl Into<String>, stack: Stack) -> Self {
        Self {
            name: name.into(),
            stack,
            status: String::new(),
        }
    }

    /// Container name on the engine. Deterministic; uniqueness is enforced
    /// by the engine itself since container names are unique per host.
    pub fn internal_name(&self) -> String {
        format!("{MANAGER_ID}-{}-{}", self.stack.name, self.name)
    }

    fn labels(&self) -> Vec<(String, String)> {
        vec![
            (LABEL_MANAGER.to_string(), MANAGER_ID.to_string()),
            (LABEL_MANAGED.to_string(), "true".to_string()),
            (LABEL_STACK.to_string(), self.stack.name.clone()),
            (LABEL_NAME.to_string(), self.name.clone()),
        ]
    }

    /// Create the backing container. Either the engine reports success or
    /// the subsystem is still absent; no partial state is kept here.
    pub fn create(&self, runtime: &ContainerRuntime, opts: &CreateOptions) -> Result<()> {
        runtime.create(
            &self.internal_name(),
            &self.stack.base,
            &self.stack.packages,
            &self.labels(),
            opts,
        )
    }

    /// Run a command inside the subsystem, creating the container first if
    /// it is absent. A stopped container is not auto-started; the engine's
    /// own error surfaces.
    pub fn exec(
        &self,
        runtime: &ContainerRuntime,
        command: &[String],
        mode: OutputMode,
        rootful: bool,
    ) -> Result<Option<String>> {
        let internal = self.internal_name();
        if !runtime.exists(&internal, rootful)? {
            self.create(
                runtime,
                &CreateOptions {
                    rootful,
                    ..Default::default()
                },
            )?;
        }
        runtime.exec(&internal, command, mode, rootful)
    }

    pub fn enter(&self, runtime: &ContainerRuntime, rootful: bool) -> Result<()> {
        runtime.enter(&self.internal_name(), rootful)
    }

    pub fn start(&self, runtime: &ContainerRuntime, rootful: bool) -> Result<()> {
        runtime.start(&self.internal_name(), rootful)
    }

    pub fn stop(&self, runtime: &ContainerRuntime, rootful: bool) -> Result<()> {
        runtime.stop(&self.internal_name(), rootful)
    }

    pub fn remove(&self, runtime: &ContainerRuntime, rootful: bool) -> Result<()> {
        runtime.remove(&self.internal_name(), rootful)
    }

    /// Export a desktop application or a binary to the host.
    ///
    /// Exactly one target must be supplied; the check happens before any
    /// engine call. The export itself stays best-effort.
    pub fn export(
        &self,
        runtime: &ContainerRuntime,
        app: Option<String>,
        bin: Option<String>,
        rootful: bool,
    ) -> Result<ExportOutcome> {
        let target = ExportTarget::from_flags(app, bin)?;
        Ok(runtime.export(&self.internal_name(), &target, rootful))
    }

    pub fn unexport(
        &self,
        runtime: &ContainerRuntime,
        app: Option<String>,
        bin: Option<String>,
        rootful: bool,
    ) -> Result<ExportOutcome> {
        let target = ExportTarget::from_flags(app, bin)?;
        Ok(runtime.unexport(&self.internal_name(), &target, rootful))
    }
}

/// Discover all subsystems from engine labels.
///
/// Containers must carry both a `name` and a `stack` label to count. A
/// record whose stack no longer resolves is dropped with a warning; the
/// listing itself still succeeds.
pub fn list_subsystems(
    runtime: &ContainerRuntime,
    stacks: &Registry<Stack>,
    rootful: bool,
) -> Result<Vec<SubSystem>> {
    let mut subsystems = Vec::new();
    for record in runtime.list(rootful)? {
        let (Some(name), Some(stack_name)) =
            (record.labels.get(LABEL_NAME), record.labels.get(LABEL_STACK))
        else {
            continue;
        };
        let stack = match stacks.resolve(stack_name) {
            Ok(stack) => stack,
            Err(err) => {
                warn!(
                    "dropping subsystem '{}': its stack '{}' cannot be resolved: {err}",
                    name, stack_name
                );
                continue;
            }
        };
        subsystems.push(SubSystem {
            name: name.clone(),
            stack,
            status: record.status,
        });
    }
    Ok(subsystems)
}

/// Find one subsystem by user-facing name.
pub fn find_subsystem(
    runtime: &ContainerRuntime,
    stacks: &Registry<Stack>,
    name: &str,
    rootful: bool,
) -> Result<SubSystem> {
    list_subsystems(runtime, stacks, rootful)?
        .into_iter()
        .find(|subsystem| subsystem.name == name)
        .ok_or_else(|| Error::NotFound {
            kind: "subsystem",
            name: name.to_string(),
        })
}
