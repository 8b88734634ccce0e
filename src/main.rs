use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use git_release::cli::Cli;
use git_release::config::load_options;
use git_release::release::Orchestrator;

fn init_tracing(is_debug: bool) {
    let default_level = if is_debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let cwd = std::env::current_dir().context("Could not read the working directory")?;

    let options = match load_options(cli.to_overrides(), &cli.sources(&cwd)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{} {}", style("ERROR").red(), e);
            std::process::exit(1);
        }
    };

    // The orchestrator reports its own errors
    if Orchestrator::new(options, cwd).run().is_err() {
        std::process::exit(1);
    }

    Ok(())
}
