//! Package manager definition management.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::output::Output;
use crate::pkgmanager::{CmdModel, PkgManager, Verb};
use crate::registry::{remove_pkg_manager, stacks_referencing};

#[derive(Debug, Args)]
pub struct PkgManagersArgs {
    #[command(subcommand)]
    pub action: PkgManagersAction,
}

#[derive(Debug, Subcommand)]
pub enum PkgManagersAction {
    /// List all package manager definitions
    List,
    /// Show one definition
    Show { name: String },
    /// Create a definition (all ten verb commands are required)
    New(NewPkgManagerArgs),
    /// Update a definition (writes a user override)
    Update(UpdatePkgManagerArgs),
    /// Remove a user-defined definition
    Rm {
        name: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct NewPkgManagerArgs {
    #[arg(long)]
    pub name: String,

    /// Prefix synthesized commands with sudo
    #[arg(long)]
    pub need_sudo: bool,

    /// Command generation model
    #[arg(long, value_enum, default_value_t = CmdModel::Templated)]
    pub model: CmdModel,

    #[arg(long)]
    pub autoremove: String,
    #[arg(long)]
    pub clean: String,
    #[arg(long)]
    pub install: String,
    #[arg(long)]
    pub list: String,
    #[arg(long)]
    pub purge: String,
    #[arg(long)]
    pub remove: String,
    #[arg(long)]
    pub search: String,
    #[arg(long)]
    pub show: String,
    #[arg(long)]
    pub update: String,
    #[arg(long)]
    pub upgrade: String,
}

#[derive(Debug, Args)]
pub struct UpdatePkgManagerArgs {
    pub name: String,

    #[arg(long)]
    pub need_sudo: Option<bool>,

    #[arg(long, value_enum)]
    pub model: Option<CmdModel>,

    #[arg(long)]
    pub autoremove: Option<String>,
    #[arg(long)]
    pub clean: Option<String>,
    #[arg(long)]
    pub install: Option<String>,
    #[arg(long)]
    pub list: Option<String>,
    #[arg(long)]
    pub purge: Option<String>,
    #[arg(long)]
    pub remove: Option<String>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub show: Option<String>,
    #[arg(long)]
    pub update: Option<String>,
    #[arg(long)]
    pub upgrade: Option<String>,
}

pub fn run(args: PkgManagersArgs, config: &Config) -> Result<()> {
    let pkg_managers = config.pkg_managers();
    let stacks = config.stacks();

    match args.action {
        PkgManagersAction::List => {
            for def in pkg_managers.list()? {
                let origin = if def.built_in { " (built-in)" } else { "" };
                Output::list_item(format!("{}{origin}", def.name));
            }
            Ok(())
        }
        PkgManagersAction::Show { name } => {
            let def = pkg_managers.resolve(&name)?;
            println!("name: {}", def.name);
            println!("needSudo: {}", def.need_sudo);
            println!("model: {:?}", def.model);
            println!("builtIn: {}", def.built_in);
            for verb in Verb::ALL {
                println!("{verb}: {}", def.command_for(verb));
            }
            let referents = stacks_referencing(&stacks, &name)?;
            if !referents.is_empty() {
                println!("used by: {}", referents.join(" "));
            }
            Ok(())
        }
        PkgManagersAction::New(args) => {
            let def = PkgManager {
                name: args.name.clone(),
                need_sudo: args.need_sudo,
                cmd_auto_remove: args.autoremove,
                cmd_clean: args.clean,
                cmd_install: args.install,
                cmd_list: args.list,
                cmd_purge: args.purge,
                cmd_remove: args.remove,
                cmd_search: args.search,
                cmd_show: args.show,
                cmd_update: args.update,
                cmd_upgrade: args.upgrade,
                model: args.model,
                built_in: false,
            };
            pkg_managers.save(&def)?;
            Output::success(format!("Package manager '{}' created.", args.name));
            Ok(())
        }
        PkgManagersAction::Update(args) => {
            let mut def = pkg_managers.resolve(&args.name)?;
            if let Some(need_sudo) = args.need_sudo {
                def.need_sudo = need_sudo;
            }
            if let Some(model) = args.model {
                def.model = model;
            }
            for (field, value) in [
                (&mut def.cmd_auto_remove, args.autoremove),
                (&mut def.cmd_clean, args.clean),
                (&mut def.cmd_install, args.install),
                (&mut def.cmd_list, args.list),
                (&mut def.cmd_purge, args.purge),
                (&mut def.cmd_remove, args.remove),
                (&mut def.cmd_search, args.search),
                (&mut def.cmd_show, args.show),
                (&mut def.cmd_update, args.update),
                (&mut def.cmd_upgrade, args.upgrade),
            ] {
                if let Some(value) = value {
                    *field = value;
                }
            }
            pkg_managers.save(&def)?;
            Output::success(format!("Package manager '{}' updated.", args.name));
            Ok(())
        }
        PkgManagersAction::Rm { name, force } => {
            if !super::confirmed(&format!("Remove package manager '{name}'?"), force)? {
                Output::info("Aborted.");
                return Ok(());
            }
            remove_pkg_manager(&pkg_managers, &stacks, &name)?;
            Output::success(format!("Package manager '{name}' removed."));
            Ok(())
        }
    }
}
