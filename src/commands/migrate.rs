//! Report containers created before the current label scheme.

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::migration::LegacyScanner;
use crate::output::Output;

#[derive(Debug, Args)]
pub struct MigrateArgs {}

pub fn run(_args: MigrateArgs, config: &Config, rootful: bool) -> Result<()> {
    let runtime = super::runtime(config)?;
    let mut scanner = LegacyScanner::new(&runtime, rootful);
    let legacy = scanner.find_legacy_containers()?;

    if legacy.is_empty() {
        Output::success("No containers need migration.");
        return Ok(());
    }

    Output::warning(format!(
        "{} container(s) were created by an older release:",
        legacy.len()
    ));
    for id in &legacy {
        Output::list_item(id);
    }
    Output::hint("Recreate them from their stacks to pick up the current labels.");
    Ok(())
}
