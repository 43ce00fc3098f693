// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # IRIS Monitor - Patient Lookup
//!
//! This crate looks up patient information by key.
//!
//! - [`PatientStore`]: data backend trait (`fetch(key) -> Option<PatientInfo>`)
//! - [`PatientService`]: key validation and delegation; see
//!   [`PatientService::profiled`] for the profiled variant
//! - `LivePatientStore` (feature `live`): SQL table lookup via sqlx
//!
//! A missing patient is `Ok(None)`, never an error.

pub mod error;
#[cfg(feature = "live")]
pub mod live;
pub mod record;
pub mod service;
pub mod store;

// Re-exports
pub use error::{PatientError, PatientResult};
#[cfg(feature = "live")]
pub use live::{DEFAULT_PATIENT_TABLE, LivePatientStore};
pub use record::PatientInfo;
pub use service::{GET_INFO_OPERATION, PatientService};
pub use store::PatientStore;
