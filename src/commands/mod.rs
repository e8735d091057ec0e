//! Command implementations, one module per command family.

pub mod completions;
pub mod migrate;
pub mod pkgmanagers;
pub mod stacks;
pub mod subsystems;
pub mod verbs;

use std::sync::Arc;

use anyhow::Result;

use crate::command_runner::RealCommandRunner;
use crate::config::{self, Config};
use crate::runtime::ContainerRuntime;

/// Ask for confirmation unless `--force` was given.
pub(crate) fn confirmed(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    Ok(cliclack::confirm(prompt).initial_value(false).interact()?)
}

/// Preflight the host and probe for a container engine.
///
/// Both failure modes (overlay root, no engine) are fatal for the whole
/// invocation; they propagate out of `main` untouched.
pub(crate) fn runtime(config: &Config) -> Result<ContainerRuntime> {
    config::ensure_supported_root()?;
    let runtime = ContainerRuntime::probe(
        Arc::new(RealCommandRunner),
        config.storage_driver.clone(),
    )?;
    Ok(runtime)
}
