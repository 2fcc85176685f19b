//! Clipdeck CLI
//!
//! Command-line front end for the clip assembly engine. Sessions are JSON
//! files; every editing command loads one, applies a single edit and writes
//! it back.
//!
//! # Usage
//!
//! ```bash
//! clipdeck assemble --clips clips.json --duration 00:02:00 --out session.json
//! clipdeck split --session session.json --item item-1234 --at 6
//! clipdeck cues --words words.json --at 00:01.5
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use clipdeck::adapters::init_logging;
use clipdeck::app::container::{AppContainer, DefaultAppContainer};
use clipdeck::cli::{commands, Cli};
use clipdeck::config_initialization::initialize_configuration;

/// Main entry point for the Clipdeck CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let container = DefaultAppContainer::new();

    let config = initialize_configuration(container.config_port().as_ref(), &cli).await?;
    init_logging(config.log_level, config.log_format)?;

    info!(
        log_level = %config.log_level,
        history_limit = config.history_limit,
        "Starting Clipdeck"
    );

    if let Err(e) = commands::run(cli.command, &container, &config).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }

    info!("Clipdeck completed successfully");
    Ok(())
}
