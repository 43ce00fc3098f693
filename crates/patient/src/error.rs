// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for patient lookups

use iris_monitor_perfmon::PerfmonError;
use thiserror::Error;

/// Result type alias for patient lookups
pub type PatientResult<T> = Result<T, PatientError>;

/// Errors that can occur while looking up patient information
///
/// A key with no matching record is not an error; lookups return `Ok(None)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatientError {
    /// The lookup key is empty or blank
    #[error("Invalid patient key: {0}")]
    InvalidKey(String),

    /// The data backend failed to answer
    #[error("Patient query failed: {0}")]
    QueryFailed(String),

    /// Invalid store configuration
    #[error("Invalid patient store configuration: {0}")]
    ConfigurationError(String),

    /// The profiling session around the lookup could not start
    #[error("Profiling error: {0}")]
    Profiling(#[from] PerfmonError),
}
