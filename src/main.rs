mod cli;
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod collector;
mod config;
mod models;
mod presenter;
mod snapshot;
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod source;
mod volume;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{App, Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::new(cli.config.as_deref(), cli.snapshot)?;

    match cli.command {
        Commands::Collect => {
            app.collect().await?;
        }
        Commands::Present => {
            app.present().await?;
        }
        Commands::Status => {
            app.status()?;
        }
    }

    Ok(())
}
