// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use anyhow::Context;
use iris_monitor_server::http::shutdown_signal;
use iris_monitor_server::{AppState, MonitorConfig, build_patient_lookup, router};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Config file path when none is given on the command line
const ENV_CONFIG_PATH: &str = "IRIS_MONITOR_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ENV_CONFIG_PATH).ok());
    let mut config = match &config_path {
        Some(path) => MonitorConfig::from_file(path)?,
        None => MonitorConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;

    tracing::info!(
        config = config_path.as_deref().unwrap_or("<defaults>"),
        perfmon_enabled = config.perfmon.enabled,
        "Starting IRIS Monitor"
    );

    let patients = build_patient_lookup(&config)
        .await
        .context("Failed to initialize patient lookup")?;

    let listener = TcpListener::bind(config.http.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.http.bind))?;
    tracing::info!(addr = %config.http.bind, "Listening");

    axum::serve(listener, router(AppState::new(patients)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shut down");
    Ok(())
}
