// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Recording profiler for testing
//!
//! Records every call in order, can be told to fail any of the three
//! procedures, and tracks how many sessions overlapped.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use iris_monitor_perfmon::{PerfmonError, PerfmonResult, ProfilingBackend, SessionMode};

/// One call observed by [`MockProfiler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilerCall {
    Start,
    GenerateReport(String),
    Stop,
}

/// In-memory profiler that records calls
#[derive(Debug, Default)]
pub struct MockProfiler {
    calls: Mutex<Vec<ProfilerCall>>,
    start_error: Option<PerfmonError>,
    report_error: Option<PerfmonError>,
    stop_error: Option<PerfmonError>,
    start_delay: Option<Duration>,
    mode: SessionMode,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockProfiler {
    /// Create a profiler whose calls all succeed
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `start()` fail with `error`
    pub fn failing_start(mut self, error: PerfmonError) -> Self {
        self.start_error = Some(error);
        self
    }

    /// Make `generate_report()` fail with `error`
    pub fn failing_report(mut self, error: PerfmonError) -> Self {
        self.report_error = Some(error);
        self
    }

    /// Make `stop()` fail with `error`
    pub fn failing_stop(mut self, error: PerfmonError) -> Self {
        self.stop_error = Some(error);
        self
    }

    /// Sleep inside `start()` to widen interleaving windows
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    /// All calls in the order they arrived
    pub fn calls(&self) -> Vec<ProfilerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Report names passed to `generate_report()`
    pub fn report_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProfilerCall::GenerateReport(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &ProfilerCall) -> usize {
        self.calls()
            .iter()
            .filter(|call| std::mem::discriminant(*call) == std::mem::discriminant(wanted))
            .count()
    }

    /// Highest number of sessions that were started and not yet stopped
    pub fn max_overlap(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn record(&self, call: ProfilerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl ProfilingBackend for MockProfiler {
    async fn start(&self) -> PerfmonResult<()> {
        self.record(ProfilerCall::Start);
        if let Some(err) = &self.start_error {
            return Err(err.clone());
        }

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn generate_report(&self, report_name: &str) -> PerfmonResult<()> {
        self.record(ProfilerCall::GenerateReport(report_name.to_string()));
        match &self.report_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn stop(&self) -> PerfmonResult<()> {
        self.record(ProfilerCall::Stop);
        self.active.fetch_sub(1, Ordering::SeqCst);
        match &self.stop_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn session_mode(&self) -> SessionMode {
        self.mode
    }
}
