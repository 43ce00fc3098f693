// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for IRIS Monitor
//!
//! This crate provides common testing components including:
//! - A recording profiler backend with failure injection
//! - An in-memory patient store
//! - Sample patients and fixed instants

pub mod fixtures;
pub mod mock_patient_store;
pub mod mock_profiler;

// Re-exports for convenience
pub use fixtures::{PatientFixtures, sample_instant};
pub use mock_patient_store::{MockPatientStore, MockPatientStoreBuilder};
pub use mock_profiler::{MockProfiler, ProfilerCall};
