// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # IRIS Monitor - Profiling Layer
//!
//! This crate brackets operations with a database engine's profiler:
//! every profiled call starts a profiling session, runs, then writes a
//! timestamped report and stops the session.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► TimedSpan ──► ProfilingBackend::start
//!               │
//!               ├────────► operation
//!               │
//!               └────────► ProfilingBackend::generate_report(name)
//!                          ProfilingBackend::stop
//! ```
//!
//! - [`TimedSpan`]: the wrapper, with async and blocking entry points
//! - [`Profiled`]: decorator pairing a service with its span label
//! - [`ProfilingBackend`]: the engine's `start` / `generateReport` / `stop`
//! - [`ReportName`]: `<Type>_<operation>_<yyyyMMdd_HHmmss>.txt`
//!
//! ## Backends
//!
//! - [`NoopProfiler`]: accepts everything, for disabled profiling
//! - `LiveSqlProfiler` (feature `live`): projected stored procedures via sqlx
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use iris_monitor_perfmon::{NoopProfiler, PerfmonError, SpanLabel, TimedSpan};
//!
//! # tokio_test::block_on(async {
//! let span = TimedSpan::new(Arc::new(NoopProfiler));
//! let label = SpanLabel::new("Job", "run").unwrap();
//! let answer: Result<u32, PerfmonError> = span.run(&label, || async { Ok(42) }).await;
//! assert_eq!(answer, Ok(42));
//! # });
//! ```

pub mod backend;
pub mod dialect;
pub mod error;
#[cfg(feature = "live")]
pub mod live;
pub mod profiled;
pub mod report;
pub mod span;

// Re-exports
pub use backend::{NoopProfiler, ProfilingBackend, SessionMode};
pub use dialect::{DEFAULT_PROCEDURE_CLASS, ProcedureClass, SqlDialect};
pub use error::{PerfmonError, PerfmonResult};
#[cfg(feature = "live")]
pub use live::LiveSqlProfiler;
pub use profiled::Profiled;
pub use report::{Clock, FixedClock, LocalClock, ReportName, SpanLabel};
pub use span::TimedSpan;
