// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # IRIS Monitor - Server
//!
//! Configuration, startup wiring and the HTTP surface for profiled
//! patient lookups.

pub mod bootstrap;
pub mod config;
pub mod http;

// Re-exports
pub use bootstrap::{BootstrapError, PatientLookup, assemble, build_patient_lookup};
pub use config::{ConfigError, MonitorConfig};
pub use http::{AppState, router};
