// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Timed-span wrapper
//!
//! [`TimedSpan`] brackets an operation with a profiling session:
//!
//! ```text
//! start() ──► operation ──► generate_report(name) ──► stop()
//!    │
//!    └─ error: returned to the caller, operation never runs
//! ```
//!
//! Once `start()` succeeds, `generate_report` and `stop` run exactly once,
//! whether the operation succeeds, fails, panics or is cancelled. Failures
//! in that cleanup phase are logged and never replace the operation's own
//! outcome.
//!
//! Backends in [`SessionMode::Exclusive`] see one session at a time: every
//! span over the same backend instance holds one shared lock from `start`
//! until `stop` has completed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock, PoisonError, Weak};
use std::time::Instant;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::backend::{ProfilingBackend, SessionMode};
use crate::error::PerfmonError;
use crate::report::{Clock, LocalClock, ReportName, SpanLabel};

type SessionLock = Arc<Mutex<()>>;

/// Session locks keyed by backend instance address
static SESSION_LOCKS: LazyLock<std::sync::Mutex<HashMap<usize, Weak<Mutex<()>>>>> =
    LazyLock::new(Default::default);

/// The lock shared by all spans over `backend`
///
/// Entries live as long as some span holds the lock. A span also holds the
/// backend, so an address cannot be reused while its entry is alive.
fn session_lock(backend: &Arc<dyn ProfilingBackend>) -> SessionLock {
    let key = Arc::as_ptr(backend) as *const () as usize;
    let mut locks = SESSION_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
        return lock;
    }
    locks.retain(|_, lock| lock.strong_count() > 0);
    let lock = SessionLock::default();
    locks.insert(key, Arc::downgrade(&lock));
    lock
}

/// Wraps operations with profiling start/report/stop side effects
#[derive(Clone)]
pub struct TimedSpan {
    backend: Arc<dyn ProfilingBackend>,
    clock: Arc<dyn Clock>,
    /// Present for exclusive backends; shared per backend instance
    exclusive: Option<SessionLock>,
}

impl TimedSpan {
    /// Create a span using local wall-clock time for report names
    pub fn new(backend: Arc<dyn ProfilingBackend>) -> Self {
        Self::with_clock(backend, Arc::new(LocalClock))
    }

    /// Create a span with an explicit clock
    pub fn with_clock(backend: Arc<dyn ProfilingBackend>, clock: Arc<dyn Clock>) -> Self {
        let exclusive = match backend.session_mode() {
            SessionMode::Exclusive => Some(session_lock(&backend)),
            SessionMode::Concurrent => None,
        };
        Self {
            backend,
            clock,
            exclusive,
        }
    }

    /// The backend this span drives
    pub fn backend(&self) -> &Arc<dyn ProfilingBackend> {
        &self.backend
    }

    /// Report name an invocation of `label` would use right now
    pub fn report_name(&self, label: &SpanLabel) -> ReportName {
        ReportName::new(label, self.clock.now())
    }

    /// Run an async operation inside a profiling session
    ///
    /// `operation` is only called after the backend started successfully.
    ///
    /// # Errors
    ///
    /// Returns the backend's `start()` error (converted into `E`) if the
    /// session could not begin. Otherwise returns exactly what the
    /// operation returned.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let label = SpanLabel::new("PatientService", "patientGetInfo")?;
    /// let info = span.run(&label, || store.fetch(key)).await?;
    /// ```
    pub async fn run<F, Fut, T, E>(&self, label: &SpanLabel, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<PerfmonError>,
    {
        let session = self.begin(label).await?;
        let outcome = operation().await;
        session.finish().await;
        outcome
    }

    /// Run a synchronous operation inside a profiling session
    ///
    /// The closure runs on tokio's blocking pool. A panic in the closure
    /// is resumed after the session has been closed.
    ///
    /// Dropping the returned future does not stop the closure. The session
    /// stays open, and keeps any exclusive lock, until the closure returns.
    pub async fn run_blocking<F, T, E>(&self, label: &SpanLabel, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<PerfmonError> + Send + 'static,
    {
        let session = self.begin(label).await?;
        let supervised = tokio::spawn(async move {
            let joined = tokio::task::spawn_blocking(operation).await;
            session.finish().await;
            joined
        });

        match supervised.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) | Err(err) if err.is_panic() => {
                std::panic::resume_unwind(err.into_panic())
            }
            Ok(Err(_)) | Err(_) => Err(PerfmonError::Cancelled(label.to_string()).into()),
        }
    }

    /// Start a session; the returned guard owns its cleanup
    async fn begin(&self, label: &SpanLabel) -> Result<ActiveSession, PerfmonError> {
        let permit = match &self.exclusive {
            Some(lock) => Some(lock.clone().lock_owned().await),
            None => None,
        };
        let report_name = self.report_name(label);

        if let Err(err) = self.backend.start().await {
            warn!(label = %label, error = %err, "Profiling session failed to start");
            return Err(err);
        }
        debug!(label = %label, report = %report_name, "Profiling session started");

        Ok(ActiveSession {
            backend: self.backend.clone(),
            report_name,
            started_at: Instant::now(),
            permit,
            finished: false,
        })
    }
}

/// A started session that has not been reported and stopped yet
struct ActiveSession {
    backend: Arc<dyn ProfilingBackend>,
    report_name: ReportName,
    started_at: Instant,
    permit: Option<OwnedMutexGuard<()>>,
    finished: bool,
}

impl ActiveSession {
    async fn finish(mut self) {
        self.finished = true;
        close_session(self.backend.as_ref(), &self.report_name).await;
        debug!(
            report = %self.report_name,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "Profiling session closed"
        );
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        // The wrapping future was dropped mid-operation, or the operation
        // panicked. Close the session on the runtime instead.
        let backend = self.backend.clone();
        let report_name = self.report_name.clone();
        let permit = self.permit.take();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(report = %report_name, "Profiled operation abandoned, closing session");
                handle.spawn(async move {
                    close_session(backend.as_ref(), &report_name).await;
                    drop(permit);
                });
            }
            Err(_) => {
                warn!(report = %report_name, "No async runtime available, profiling session left open");
            }
        }
    }
}

/// Generate the report, then stop; both are attempted even if one fails
async fn close_session(backend: &dyn ProfilingBackend, report_name: &ReportName) {
    if let Err(err) = backend.generate_report(report_name.as_str()).await {
        warn!(report = %report_name, error = %err, "Failed to generate profiling report");
    }
    if let Err(err) = backend.stop().await {
        warn!(report = %report_name, error = %err, "Failed to stop profiling session");
    }
}
