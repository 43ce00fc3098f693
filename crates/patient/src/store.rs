// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Patient store trait
//!
//! This module defines the data backend interface used by the lookup service,
//! and its profiled decorator.

use std::sync::Arc;

use iris_monitor_perfmon::Profiled;

use crate::error::PatientResult;
use crate::record::PatientInfo;

/// Data backend for patient information
///
/// # Examples
///
/// ```rust,ignore
/// use iris_monitor_patient::{PatientStore, PatientResult};
///
/// async fn patient_name(store: &impl PatientStore, key: &str) -> PatientResult<Option<String>> {
///     Ok(store.fetch(key).await?.and_then(|info| info.name))
/// }
/// ```
#[async_trait::async_trait]
pub trait PatientStore: Send + Sync {
    /// Fetch the record stored under `key`
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no record matches.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::QueryFailed` if the backend cannot answer.
    async fn fetch(&self, key: &str) -> PatientResult<Option<PatientInfo>>;
}

#[async_trait::async_trait]
impl<S: PatientStore + ?Sized> PatientStore for Arc<S> {
    async fn fetch(&self, key: &str) -> PatientResult<Option<PatientInfo>> {
        (**self).fetch(key).await
    }
}

/// Every fetch runs inside the decorator's profiling session
#[async_trait::async_trait]
impl<S: PatientStore> PatientStore for Profiled<S> {
    async fn fetch(&self, key: &str) -> PatientResult<Option<PatientInfo>> {
        self.call(|store| store.fetch(key)).await
    }
}
