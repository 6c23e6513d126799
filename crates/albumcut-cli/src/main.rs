mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "albumcut=info,albumcut_core=info",
        1 => "albumcut=debug,albumcut_core=debug",
        2 => "albumcut=trace,albumcut_core=trace",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Cut { link, options } => {
            commands::cut::run(&link, &options, cli.config.as_deref()).await
        }
        Commands::Doctor => commands::doctor::run().await,
        Commands::Config => commands::config::run(cli.config.as_deref()).await,
    }
}
