//! CLI argument definitions for apx.
//!
//! Separated from `main.rs` so that library code and shell completion
//! generation can reference these types. Per-subsystem verbs are captured
//! as an external subcommand: `apx <subsystem> <verb> [args...]`.

use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Debug, Parser)]
#[command(name = "apx")]
#[command(about = "Apx - install and manage packages inside managed containers")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Operate on rootful containers (engine commands re-enter through
    /// sudo; helper commands use their own --root flag)
    #[arg(long, global = true)]
    pub rootful: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage stacks (base image + package manager + default packages)
    Stacks(commands::stacks::StacksArgs),

    /// Manage package manager definitions
    #[command(name = "pkgmanagers")]
    PkgManagers(commands::pkgmanagers::PkgManagersArgs),

    /// Manage subsystems (containers bound to a stack)
    Subsystems(commands::subsystems::SubsystemsArgs),

    /// Report containers created by older releases that need migration
    Migrate(commands::migrate::MigrateArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),

    /// Run a verb inside a subsystem: apx <subsystem> <verb> [args...]
    ///
    /// Package verbs (install, remove, search, show, list, update,
    /// upgrade, autoremove, clean, purge) are translated through the
    /// stack's package manager. Also: run, enter, start, stop,
    /// export/unexport --app|--bin.
    #[command(external_subcommand)]
    Subsystem(Vec<String>),
}
