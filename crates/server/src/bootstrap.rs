// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Startup wiring
//!
//! Connects the datasource, picks a profiler backend and assembles the
//! profiled patient lookup.
//!
//! Profiler policy:
//! - `perfmon.enabled = false`: [`NoopProfiler`], no profiler connection
//! - profiler unreachable and `perfmon.required = true`: startup fails
//! - profiler unreachable and `perfmon.required = false`: warn, use [`NoopProfiler`]

use std::sync::Arc;
use std::time::Duration;

use iris_monitor_patient::{
    LivePatientStore, PatientError, PatientResult, PatientService, PatientStore,
};
use iris_monitor_perfmon::{
    LiveSqlProfiler, NoopProfiler, PerfmonError, ProcedureClass, Profiled, ProfilingBackend,
    TimedSpan,
};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use tracing::{info, warn};

use crate::config::{ConfigError, DataSourceConfig, MonitorConfig, PerfmonConfig};

/// Profiled patient lookup served over HTTP
pub type PatientLookup = PatientService<Profiled<Arc<dyn PatientStore>>>;

/// Errors raised while bringing the server up
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to connect to datasource: {0}")]
    Datasource(String),

    #[error("Profiler unavailable: {0}")]
    Profiler(#[from] PerfmonError),

    #[error(transparent)]
    Patient(#[from] PatientError),
}

/// Open a connection pool and verify one connection
pub async fn connect_pool(
    config: &DataSourceConfig,
    max_connections: u32,
) -> Result<AnyPool, BootstrapError> {
    sqlx::any::install_default_drivers();
    let url = config.connection_url()?;

    AnyPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(config.min_connections.min(max_connections))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&url)
        .await
        .map_err(|e| BootstrapError::Datasource(e.to_string()))
}

/// Build the profiler backend according to the perfmon policy
pub async fn build_profiler(
    config: &MonitorConfig,
) -> Result<Arc<dyn ProfilingBackend>, BootstrapError> {
    if !config.perfmon.enabled {
        info!("Profiling disabled");
        return Ok(Arc::new(NoopProfiler));
    }

    let connected = connect_profiler(config).await;
    resolve_profiler(&config.perfmon, connected)
}

/// Profiler sessions are exclusive; one connection is enough
async fn connect_profiler(
    config: &MonitorConfig,
) -> Result<Arc<dyn ProfilingBackend>, BootstrapError> {
    let dialect = config.datasource.dialect()?;
    let procedures = ProcedureClass::parse(&config.perfmon.procedure_class)?;
    let pool = connect_pool(&config.datasource, 1).await?;

    let profiler = LiveSqlProfiler::new(pool, dialect, procedures)
        .with_call_timeout(config.perfmon.call_timeout_secs)?;
    info!(
        procedure_class = %config.perfmon.procedure_class,
        timeout_secs = config.perfmon.call_timeout_secs,
        "Profiler connected"
    );
    Ok(Arc::new(profiler))
}

/// Apply the `required` policy to a profiler connection attempt
pub fn resolve_profiler(
    config: &PerfmonConfig,
    connected: Result<Arc<dyn ProfilingBackend>, BootstrapError>,
) -> Result<Arc<dyn ProfilingBackend>, BootstrapError> {
    match connected {
        Ok(profiler) => Ok(profiler),
        Err(e) if config.required => Err(e),
        Err(e) => {
            warn!(error = %e, "Profiler unavailable, serving lookups without profiling");
            Ok(Arc::new(NoopProfiler))
        }
    }
}

/// Wrap a store and profiler into the served lookup
pub fn assemble(
    store: Arc<dyn PatientStore>,
    profiler: Arc<dyn ProfilingBackend>,
) -> PatientResult<PatientLookup> {
    PatientService::profiled(store, TimedSpan::new(profiler))
}

/// Connect everything the server needs
pub async fn build_patient_lookup(config: &MonitorConfig) -> Result<PatientLookup, BootstrapError> {
    let profiler = build_profiler(config).await?;

    let dialect = config.datasource.dialect()?;
    let pool = connect_pool(&config.datasource, config.datasource.max_connections).await?;
    info!(
        max_connections = config.datasource.max_connections,
        table = %config.patient.table,
        "Patient datasource ready"
    );

    let store: Arc<dyn PatientStore> =
        Arc::new(LivePatientStore::new(pool, dialect, &config.patient.table)?);
    Ok(assemble(store, profiler)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_monitor_perfmon::SessionMode;

    fn perfmon(required: bool) -> PerfmonConfig {
        PerfmonConfig {
            required,
            ..Default::default()
        }
    }

    fn unreachable() -> Result<Arc<dyn ProfilingBackend>, BootstrapError> {
        Err(BootstrapError::Datasource("connection refused".to_string()))
    }

    #[test]
    fn test_required_profiler_failure_is_fatal() {
        let result = resolve_profiler(&perfmon(true), unreachable());
        assert!(matches!(result, Err(BootstrapError::Datasource(_))));
    }

    #[test]
    fn test_optional_profiler_failure_falls_back_to_noop() {
        let profiler = resolve_profiler(&perfmon(false), unreachable()).unwrap();
        assert_eq!(profiler.session_mode(), SessionMode::Concurrent);
    }

    #[test]
    fn test_connected_profiler_is_kept() {
        let connected: Arc<dyn ProfilingBackend> = Arc::new(NoopProfiler);
        let profiler = resolve_profiler(&perfmon(true), Ok(connected.clone())).unwrap();
        assert!(Arc::ptr_eq(&profiler, &connected));
    }

    #[tokio::test]
    async fn test_disabled_profiler_skips_connection() {
        let mut config = MonitorConfig::default();
        config.perfmon.enabled = false;
        // No datasource is configured; a connection attempt would fail.
        let profiler = build_profiler(&config).await.unwrap();
        assert_eq!(profiler.session_mode(), SessionMode::Concurrent);
    }

    #[tokio::test]
    async fn test_required_profiler_with_bad_url_fails() {
        let mut config = MonitorConfig::default();
        config.datasource.url = "sqlserver://nowhere/db".to_string();
        assert!(build_profiler(&config).await.is_err());

        config.perfmon.required = false;
        assert!(build_profiler(&config).await.is_ok());
    }
}
