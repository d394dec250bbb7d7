mod bootstrap;
mod webhook;

use anyhow::Result;

use tiendy_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use tiendy_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    // The monitor sweep runs independently of message handling for the
    // whole process lifetime.
    tokio::spawn(app.monitor.clone().run());

    let bind_address = app.config.server.bind_address.clone();
    let port = app.config.server.port;
    let dialogue = app.router.clone();
    tokio::spawn(async move {
        if let Err(error) = webhook::serve(&bind_address, port, dialogue).await {
            tracing::error!(
                event_name = "system.webhook.error",
                error = %error,
                "webhook server terminated unexpectedly"
            );
        }
    });

    tracing::info!(event_name = "system.server.started", "tiendy-server started");
    wait_for_shutdown().await?;
    tracing::info!(event_name = "system.server.stopping", "tiendy-server stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
