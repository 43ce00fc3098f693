// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Live profiler backed by stored procedures
//!
//! The engine exposes its profiler as a class with `start`,
//! `generateReport(name)` and `stop` methods, projected as SQL routines.
//! [`LiveSqlProfiler`] calls those routines over an sqlx pool.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use iris_monitor_perfmon::{LiveSqlProfiler, ProcedureClass, SqlDialect};
//!
//! sqlx::any::install_default_drivers();
//! let pool = sqlx::AnyPool::connect("mysql://user:pw@localhost:3306/app").await?;
//! let profiler = LiveSqlProfiler::new(pool, SqlDialect::MySql, ProcedureClass::default());
//! ```

use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
use tracing::debug;

use crate::backend::ProfilingBackend;
use crate::dialect::{ProcedureClass, SqlDialect};
use crate::error::{PerfmonError, PerfmonResult};

/// Default timeout for a single profiler call in seconds
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;

/// Profiler that calls the engine's projected routines
pub struct LiveSqlProfiler {
    pool: AnyPool,
    dialect: SqlDialect,
    procedures: ProcedureClass,
    call_timeout_secs: u64,
}

impl LiveSqlProfiler {
    pub fn new(pool: AnyPool, dialect: SqlDialect, procedures: ProcedureClass) -> Self {
        Self {
            pool,
            dialect,
            procedures,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
        }
    }

    /// Override the per-call timeout
    pub fn with_call_timeout(mut self, secs: u64) -> PerfmonResult<Self> {
        if secs == 0 {
            return Err(PerfmonError::ConfigurationError(
                "call_timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.call_timeout_secs = secs;
        Ok(self)
    }

    pub fn call_timeout_secs(&self) -> u64 {
        self.call_timeout_secs
    }

    async fn call(&self, method: &str, argument: Option<&str>) -> PerfmonResult<()> {
        let routine = self.procedures.routine(method);
        let sql = call_statement(&routine, self.dialect, argument.is_some());

        let mut query = sqlx::query::<sqlx::Any>(&sql);
        if let Some(argument) = argument {
            query = query.bind(argument);
        }

        debug!(routine = %routine, "Calling profiler routine");
        let timeout = Duration::from_secs(self.call_timeout_secs);
        match tokio::time::timeout(timeout, query.execute(&self.pool)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(PerfmonError::procedure(routine, err)),
            Err(_) => Err(PerfmonError::Timeout {
                procedure: routine,
                secs: self.call_timeout_secs,
            }),
        }
    }
}

/// `CALL` statement for `routine`, with one bound argument if requested
fn call_statement(routine: &str, dialect: SqlDialect, with_argument: bool) -> String {
    if with_argument {
        format!("CALL {}({})", routine, dialect.placeholder(1))
    } else {
        format!("CALL {}()", routine)
    }
}

#[async_trait]
impl ProfilingBackend for LiveSqlProfiler {
    async fn start(&self) -> PerfmonResult<()> {
        self.call("start", None).await
    }

    async fn generate_report(&self, report_name: &str) -> PerfmonResult<()> {
        self.call("generateReport", Some(report_name)).await
    }

    async fn stop(&self) -> PerfmonResult<()> {
        self.call("stop", None).await
    }
}
