//! Cardiorisk: CHD risk prediction service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::config::{LogMode, Settings};
use cardiorisk::{http, PredictionService};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env().context("Invalid configuration")?;

    // Initialize logging.
    let (writer, _guard) = match settings.log.mode {
        LogMode::File => {
            if let Some(parent) = settings.log.file.parent() {
                // Best-effort: the open below reports the real failure.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&settings.log.file)
                .with_context(|| format!("Failed to open log file {:?}", settings.log.file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Cardiorisk v{}...", env!("CARGO_PKG_VERSION"));

    let service =
        PredictionService::new(settings.policy).with_model_dir(&settings.model_dir);
    match service.reload() {
        Ok(metadata) => tracing::info!("Model '{}' ready", metadata.model_name),
        Err(e) if settings.require_model => {
            return Err(anyhow::Error::new(e).context(format!(
                "Failed to load model from {:?} (set CARDIORISK_REQUIRE_MODEL=false to start without one)",
                settings.model_dir
            )));
        }
        Err(e) => tracing::warn!("Starting without a model: {}", e),
    }

    let app = http::router(Arc::new(service))
        .layer(http::cors_layer(&settings.cors_origins)?)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    tracing::info!("Listening on http://{}", settings.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Cardiorisk shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
