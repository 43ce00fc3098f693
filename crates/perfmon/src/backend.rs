// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profiling backend trait
//!
//! This module defines the async interface to the engine's profiler and a
//! no-op implementation for deployments where profiling is disabled.

use crate::error::PerfmonResult;

/// How a backend copes with sessions from concurrent invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// One session at a time; the wrapper serializes invocations
    #[default]
    Exclusive,
    /// Independent sessions keyed by report name may overlap
    Concurrent,
}

/// Profiling backend abstraction
///
/// A backend exposes the three profiler procedures the timed-span wrapper
/// drives. Implementations talk to a live database engine, record calls
/// for tests, or do nothing at all.
///
/// # Examples
///
/// ```rust,ignore
/// use iris_monitor_perfmon::{ProfilingBackend, PerfmonResult};
///
/// async fn profile_once(backend: &impl ProfilingBackend) -> PerfmonResult<()> {
///     backend.start().await?;
///     backend.generate_report("Job_run_20240305_080910.txt").await?;
///     backend.stop().await
/// }
/// ```
#[async_trait::async_trait]
pub trait ProfilingBackend: Send + Sync {
    /// Begin collecting profiling data
    ///
    /// # Errors
    ///
    /// Returns `PerfmonError::ConnectionFailed` if the backend is unreachable.
    /// Returns `PerfmonError::ProcedureFailed` if the engine rejects the call.
    async fn start(&self) -> PerfmonResult<()>;

    /// Write the collected data to a report artifact named `report_name`
    async fn generate_report(&self, report_name: &str) -> PerfmonResult<()>;

    /// Finish collecting profiling data
    async fn stop(&self) -> PerfmonResult<()>;

    /// Whether sessions from concurrent invocations may overlap
    fn session_mode(&self) -> SessionMode {
        SessionMode::Exclusive
    }
}

/// Backend that accepts every call without doing anything
///
/// Used when profiling is disabled, or optional and unreachable at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProfiler;

#[async_trait::async_trait]
impl ProfilingBackend for NoopProfiler {
    async fn start(&self) -> PerfmonResult<()> {
        Ok(())
    }

    async fn generate_report(&self, _report_name: &str) -> PerfmonResult<()> {
        Ok(())
    }

    async fn stop(&self) -> PerfmonResult<()> {
        Ok(())
    }

    fn session_mode(&self) -> SessionMode {
        SessionMode::Concurrent
    }
}
