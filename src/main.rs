use anyhow::Result;
use clap::{Parser, Subcommand};
use portfolio_api::config::Config;

/// portfolio-api - contact submission backend for a personal portfolio site
#[derive(Parser)]
#[command(name = "portfolio-api")]
#[command(about = "Contact form backend with quota, bot-check and email dispatch", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize observability (tracing + logging)
    portfolio_api::observability::init_observability(
        "portfolio-api",
        env!("CARGO_PKG_VERSION"),
        &config.observability.log_level,
    )?;

    match cli.command {
        Commands::Serve { host, port } => serve_command(config, host, port).await,
    }
}

#[tracing::instrument(skip(config))]
async fn serve_command(
    config: Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting portfolio-api server...");

    // Use CLI overrides if provided, otherwise use config
    let host = host_override.unwrap_or_else(|| config.server.host.clone());
    let port = port_override.unwrap_or(config.server.port);

    portfolio_api::server::serve(config, host, port).await
}
