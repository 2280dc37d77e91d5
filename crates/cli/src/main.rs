//! assetmill CLI, the main entry point.
//!
//! Commands:
//! - `init`: Write a starter `assetmill.toml` and source directories
//! - `build`: Seed sources and write every bundle to disk
//! - `serve`: Seed, serve over HTTP and watch sources for changes
//! - `status`: Show configuration and bundle sizes

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod pipeline;

#[derive(Parser)]
#[command(
    name = "assetmill",
    about = "assetmill: live-reconciled web asset bundler",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file to use instead of ./assetmill.toml
    #[arg(short, long, global = true, env = "ASSETMILL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration and create source directories
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Build every bundle into the output directory
    Build,

    /// Serve bundles over HTTP and rebuild them as sources change
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve the seeded bundles without watching sources
        #[arg(long)]
        no_watch: bool,
    },

    /// Show configuration and bundle status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Build => commands::build::run(config_path).await?,
        Commands::Serve { port, no_watch } => commands::serve::run(config_path, port, no_watch).await?,
        Commands::Status => commands::status::run(config_path).await?,
    }

    Ok(())
}
