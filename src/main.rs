//! Parking reservation service
//!
//! Headless slot reservation engine: loads configuration, opens the
//! database, runs the activation sweep and waits for SIGINT/SIGTERM.
//!
//! ```sh
//! # Run with default config (~/.config/parking-reservation/config.toml)
//! parking-reservation
//!
//! # Custom config path
//! parking-reservation --config /etc/parking-reservation/config.toml
//!
//! # Validate config without starting
//! parking-reservation --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use parking_reservation::config::{default_config_path, AppConfig};
use parking_reservation::server::{init_tracing, ServerHandle, ServerOptions};

/// Slot reservation engine for parking sites.
#[derive(Parser, Debug)]
#[command(
    name = "parking-reservation",
    version,
    about = "Slot reservation engine for parking sites",
    long_about = "Slot reservation engine: availability, pricing and booking lifecycle \
                  for parking sites.\n\n\
                  Default config: ~/.config/parking-reservation/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the database URL.
    #[arg(long)]
    database_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) if cli.check => {
            eprintln!("Configuration is invalid: {e}");
            std::process::exit(1);
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            return Err(e.into());
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("Configuration is valid");
        println!("   Config file  : {}", config_path.display());
        println!("   Database     : {}", config.database.url);
        println!("   Log level    : {}", config.logging.level);
        println!("   Lock timeout : {} ms", config.reservation.lock_timeout_ms);
        return Ok(());
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    // ── Start service ──────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("Press Ctrl+C to shut down gracefully.");

    handle.wait().await;

    Ok(())
}
