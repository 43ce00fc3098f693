// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Patient lookup service
//!
//! [`PatientService`] validates lookup keys and delegates to a
//! [`PatientStore`]. Built with [`PatientService::profiled`], each lookup
//! runs inside a profiling session labeled `PatientService_patientGetInfo`.

use iris_monitor_perfmon::{Profiled, SpanLabel, TimedSpan};
use tracing::debug;

use crate::error::{PatientError, PatientResult};
use crate::record::PatientInfo;
use crate::store::PatientStore;

/// Operation name used in profiling report names
pub const GET_INFO_OPERATION: &str = "patientGetInfo";

/// Read-only lookup of patient information by key
pub struct PatientService<S> {
    store: S,
}

impl<S: PatientStore> PatientService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Look up the patient stored under `key`
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no patient matches; the record is returned exactly
    /// as the store produced it otherwise.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidKey` for an empty or blank key, before
    /// the store is consulted.
    pub async fn patient_get_info(&self, key: &str) -> PatientResult<Option<PatientInfo>> {
        if key.trim().is_empty() {
            return Err(PatientError::InvalidKey(
                "key must not be blank".to_string(),
            ));
        }

        let info = self.store.fetch(key).await?;
        debug!(key = %key, found = info.is_some(), "Patient lookup finished");
        Ok(info)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: PatientStore> PatientService<Profiled<S>> {
    /// Build a service whose lookups are profiled through `span`
    pub fn profiled(store: S, span: TimedSpan) -> PatientResult<Self> {
        let label = SpanLabel::of::<PatientService<S>>(GET_INFO_OPERATION)?;
        Ok(Self::new(Profiled::new(store, span, label)))
    }
}
