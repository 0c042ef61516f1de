//! Tequila - Latin curriculum dashboard CLI
//!
#![doc = "Tequila - Latin curriculum dashboard CLI"]
#![doc = "Main entry point for the Tequila command-line client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tequila::cli::{Cli, Commands};
use tequila::commands;
use tequila::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;
    tracing::debug!("Using backend at {}", config.api.base_url);

    // Execute command
    match cli.command {
        Commands::Weeks { command } => {
            tracing::info!("Starting weeks command");
            commands::weeks::handle_weeks(&config, command).await?;
            Ok(())
        }
        Commands::Day { command } => {
            tracing::info!("Starting day command");
            commands::days::handle_day(&config, command).await?;
            Ok(())
        }
        Commands::Generate { command } => {
            tracing::info!("Starting generation command");
            commands::generate::handle_generate(&config, command).await?;
            Ok(())
        }
        Commands::Usage { command } => {
            tracing::info!("Starting usage command");
            commands::usage::handle_usage(&config, command).await?;
            Ok(())
        }
        Commands::Events => {
            tracing::info!("Starting event stream");
            commands::events::follow_events(&config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "tequila=debug" } else { "tequila=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
