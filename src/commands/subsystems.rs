//! Subsystem lifecycle management.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::output::Output;
use crate::runtime::CreateOptions;
use crate::subsystem::{SubSystem, find_subsystem, list_subsystems};

#[derive(Debug, Args)]
pub struct SubsystemsArgs {
    #[command(subcommand)]
    pub action: SubsystemsAction,
}

#[derive(Debug, Subcommand)]
pub enum SubsystemsAction {
    /// List all subsystems discovered on the engine
    List,
    /// Create a subsystem from a stack
    New {
        #[arg(long)]
        name: String,

        /// Stack to bind the new subsystem to
        #[arg(long)]
        stack: String,

        /// Run an init process inside the container
        #[arg(long)]
        init: bool,

        /// Do not share host namespaces with the container
        #[arg(long)]
        unshare_all: bool,

        /// Extra engine flags, passed through verbatim (quoted string)
        #[arg(long)]
        extra_flags: Option<String>,
    },
    /// Remove a subsystem and its container
    Rm {
        name: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub fn run(args: SubsystemsArgs, config: &Config, rootful: bool) -> Result<()> {
    let runtime = super::runtime(config)?;
    let stacks = config.stacks();

    match args.action {
        SubsystemsAction::List => {
            for subsystem in list_subsystems(&runtime, &stacks, rootful)? {
                Output::list_item(format!(
                    "{} [stack: {}] {}",
                    subsystem.name, subsystem.stack.name, subsystem.status
                ));
            }
            Ok(())
        }
        SubsystemsAction::New {
            name,
            stack,
            init,
            unshare_all,
            extra_flags,
        } => {
            let stack = stacks.resolve(&stack)?;
            let subsystem = SubSystem::new(name.clone(), stack);
            let opts = CreateOptions {
                init,
                rootful,
                unshare_all,
                extra_flags: extra_flags
                    .as_deref()
                    .and_then(shlex::split)
                    .unwrap_or_default(),
            };

            let spinner = Output::spinner(format!(
                "Creating subsystem '{name}' (this may take a while)..."
            ));
            match subsystem.create(&runtime, &opts) {
                Ok(()) => {
                    spinner.finish_success(format!("Subsystem '{name}' created."));
                    Output::hint(format!("Enter it with: apx {name} enter"));
                    Ok(())
                }
                Err(err) => {
                    spinner.finish_error(format!("Could not create subsystem '{name}'."));
                    Err(err.into())
                }
            }
        }
        SubsystemsAction::Rm { name, force } => {
            let subsystem = find_subsystem(&runtime, &stacks, &name, rootful)?;
            if !super::confirmed(
                &format!("Remove subsystem '{name}' and its container?"),
                force,
            )? {
                Output::info("Aborted.");
                return Ok(());
            }
            subsystem.remove(&runtime, rootful)?;
            Output::success(format!("Subsystem '{name}' removed."));
            Ok(())
        }
    }
}
