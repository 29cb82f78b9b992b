//! Tubecoach CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use tubecoach::cli::{commands, Cli, Commands};
use tubecoach::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = || {
        EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubecoach={}", log_level)),
        )
    };

    let file_layer = match settings.log_file() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(&path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter()),
        )
        .with(file_layer)
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Chat { profile } => {
            commands::run_chat(profile.as_deref(), settings).await?;
        }

        Commands::Analyze {
            input,
            profile,
            image_out,
        } => {
            commands::run_analyze(input, profile.as_deref(), image_out.clone(), settings).await?;
        }

        Commands::Transcript { video, output } => {
            commands::run_transcript(video, output.clone(), settings).await?;
        }

        Commands::Serve {
            host,
            port,
            profile,
        } => {
            commands::run_serve(host, *port, profile.clone(), settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
