use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apx::commands;
use apx::config::Config;
use apx::{Cli, Commands};

fn main() -> Result<()> {
    // e.g. RUST_LOG=apx=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Stacks(args) => commands::stacks::run(args, &config),
        Commands::PkgManagers(args) => commands::pkgmanagers::run(args, &config),
        Commands::Subsystems(args) => commands::subsystems::run(args, &config, cli.rootful),
        Commands::Migrate(args) => commands::migrate::run(args, &config, cli.rootful),
        Commands::Completions(args) => commands::completions::run(args),
        Commands::Subsystem(argv) => commands::verbs::run(argv, &config, cli.rootful),
    }
}
