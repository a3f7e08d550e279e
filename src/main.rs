use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use homepage::config::Config;

/// Homepage: a single-tenant dashboard behind one shared password.
#[derive(Parser)]
#[command(name = "homepage", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on (default: HOMEPAGE_PORT or 3000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: HOMEPAGE_BIND or 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show whether authentication is enabled and how cookies are flagged
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("homepage=info,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let mut config = Config::load()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            info!(?config, "Starting homepage server");
            homepage::web::run_server(config).await?;
        }

        Commands::Status => {
            let config = Config::load()?;
            let auth = if config.auth_enabled() {
                "enabled (HOMEPAGE_PASSWORD is set)"
            } else {
                "disabled (HOMEPAGE_PASSWORD is not set)"
            };
            let secure = if config.production { "yes" } else { "no" };
            println!("Authentication:  {auth}");
            println!("Secure cookies:  {secure}");
            println!("Listen address:  {}:{}", config.bind, config.port);
        }
    }

    Ok(())
}
