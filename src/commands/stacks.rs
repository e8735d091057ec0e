//! Stack definition management.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::error::Error;
use crate::output::Output;
use crate::stack::Stack;

#[derive(Debug, Args)]
pub struct StacksArgs {
    #[command(subcommand)]
    pub action: StacksAction,
}

#[derive(Debug, Subcommand)]
pub enum StacksAction {
    /// List all stacks (user overrides shadow built-ins)
    List,
    /// Show one stack definition
    Show { name: String },
    /// Create a stack definition
    New {
        #[arg(long)]
        name: String,

        /// Container base image reference
        #[arg(long)]
        base: String,

        /// Package manager definition used inside the container
        #[arg(long = "pkg-manager")]
        pkg_manager: String,

        /// Packages pre-installed at container creation (comma-separated)
        #[arg(long, value_delimiter = ',')]
        packages: Vec<String>,
    },
    /// Update a stack definition (writes a user override)
    Update {
        name: String,

        #[arg(long)]
        base: Option<String>,

        #[arg(long = "pkg-manager")]
        pkg_manager: Option<String>,

        #[arg(long, value_delimiter = ',')]
        packages: Option<Vec<String>>,
    },
    /// Remove a user-defined stack
    Rm {
        name: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub fn run(args: StacksArgs, config: &Config) -> Result<()> {
    let stacks = config.stacks();
    let pkg_managers = config.pkg_managers();

    match args.action {
        StacksAction::List => {
            for stack in stacks.list()? {
                let origin = if stack.built_in { " (built-in)" } else { "" };
                Output::list_item(format!(
                    "{} [{} / {}]{origin}",
                    stack.name, stack.base, stack.pkg_manager
                ));
            }
            Ok(())
        }
        StacksAction::Show { name } => {
            let stack = stacks.resolve(&name)?;
            println!("name: {}", stack.name);
            println!("base: {}", stack.base);
            println!("pkgManager: {}", stack.pkg_manager);
            println!("builtIn: {}", stack.built_in);
            println!("packages: {}", stack.packages.join(" "));
            Ok(())
        }
        StacksAction::New {
            name,
            base,
            pkg_manager,
            packages,
        } => {
            if !pkg_managers.exists(&pkg_manager) {
                return Err(Error::NotFound {
                    kind: "package manager",
                    name: pkg_manager,
                }
                .into());
            }
            let stack = Stack {
                name: name.clone(),
                base,
                packages,
                pkg_manager,
                built_in: false,
            };
            stacks.save(&stack)?;
            Output::success(format!("Stack '{name}' created."));
            Ok(())
        }
        StacksAction::Update {
            name,
            base,
            pkg_manager,
            packages,
        } => {
            let mut stack = stacks.resolve(&name)?;
            if let Some(base) = base {
                stack.base = base;
            }
            if let Some(pkg_manager) = pkg_manager {
                if !pkg_managers.exists(&pkg_manager) {
                    return Err(Error::NotFound {
                        kind: "package manager",
                        name: pkg_manager,
                    }
                    .into());
                }
                stack.pkg_manager = pkg_manager;
            }
            if let Some(packages) = packages {
                stack.packages = packages;
            }
            stacks.save(&stack)?;
            Output::success(format!("Stack '{name}' updated."));
            Ok(())
        }
        StacksAction::Rm { name, force } => {
            let stack = stacks.resolve(&name)?;
            if !super::confirmed(&format!("Remove stack '{name}'?"), force)? {
                Output::info("Aborted.");
                return Ok(());
            }
            stacks.remove(&stack)?;
            Output::success(format!("Stack '{name}' removed."));
            Ok(())
        }
    }
}
