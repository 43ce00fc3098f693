// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for profiling operations
//!
//! This module defines the error types used by profiling backends and the
//! timed-span wrapper.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for profiling operations
pub type PerfmonResult<T> = Result<T, PerfmonError>;

/// Errors that can occur while driving a profiling session
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum PerfmonError {
    /// Failed to connect to the profiling backend
    #[error("Failed to connect to profiling backend: {0}")]
    ConnectionFailed(String),

    /// A profiler procedure returned an error
    #[error("Profiler procedure '{procedure}' failed: {message}")]
    ProcedureFailed { procedure: String, message: String },

    /// A profiler procedure did not answer in time
    #[error("Profiler procedure '{procedure}' timed out after {secs}s")]
    Timeout { procedure: String, secs: u64 },

    /// Invalid profiler configuration
    #[error("Invalid profiler configuration: {0}")]
    ConfigurationError(String),

    /// The operation label cannot be used in a report name
    #[error("Invalid span label '{0}'")]
    InvalidLabel(String),

    /// The profiled operation was cancelled before it produced a result
    #[error("Profiled operation '{0}' was cancelled")]
    Cancelled(String),
}

impl PerfmonError {
    /// Build a [`PerfmonError::ProcedureFailed`] from any displayable error
    pub fn procedure(procedure: impl Into<String>, err: impl std::fmt::Display) -> Self {
        PerfmonError::ProcedureFailed {
            procedure: procedure.into(),
            message: err.to_string(),
        }
    }
}
