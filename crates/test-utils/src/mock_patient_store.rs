// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock patient store implementation for testing
//!
//! Provides an in-memory store with builder pattern for easy test setup

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use iris_monitor_patient::{PatientError, PatientInfo, PatientResult, PatientStore};

/// In-memory mock patient store for testing
#[derive(Debug, Default)]
pub struct MockPatientStore {
    patients: HashMap<String, PatientInfo>,
    failure: Option<PatientError>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl MockPatientStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a patient, keyed by its `key`
    pub fn add_patient(mut self, patient: PatientInfo) -> Self {
        self.patients.insert(patient.key.clone(), patient);
        self
    }

    /// Number of `fetch` calls served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PatientStore for MockPatientStore {
    async fn fetch(&self, key: &str) -> PatientResult<Option<PatientInfo>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.patients.get(key).cloned())
    }
}

/// Builder for creating mock stores with a fluent API
pub struct MockPatientStoreBuilder {
    store: MockPatientStore,
}

impl Default for MockPatientStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPatientStoreBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            store: MockPatientStore::new(),
        }
    }

    /// Add the standard test patients (see [`crate::fixtures::PatientFixtures`])
    pub fn with_standard_patients(mut self) -> Self {
        for patient in crate::fixtures::PatientFixtures::standard() {
            self.store = self.store.add_patient(patient);
        }
        self
    }

    /// Add a custom patient
    pub fn with_patient(mut self, patient: PatientInfo) -> Self {
        self.store = self.store.add_patient(patient);
        self
    }

    /// Make every fetch fail with `error`
    pub fn failing_with(mut self, error: PatientError) -> Self {
        self.store.failure = Some(error);
        self
    }

    /// Delay every fetch by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.store.latency = Some(latency);
        self
    }

    /// Build the mock store
    pub fn build(self) -> MockPatientStore {
        self.store
    }
}
