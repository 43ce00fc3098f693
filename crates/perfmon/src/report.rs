// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Span labels and report names
//!
//! A report artifact is named `<Type>_<operation>_<yyyyMMdd_HHmmss>.txt`.
//! Downstream tooling matches on this layout, so it must not change.
//!
//! The timestamp has one-second precision: two invocations of the same
//! label within the same second produce the same report name.

use std::fmt;

use chrono::{Local, NaiveDateTime};

use crate::error::{PerfmonError, PerfmonResult};

/// Timestamp layout used in report names
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File extension of report artifacts
pub const REPORT_EXTENSION: &str = "txt";

/// Identity of a profiled operation
///
/// Usually `<DeclaringType>_<operation>`, e.g. `PatientService_patientGetInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanLabel(String);

impl SpanLabel {
    /// Build a label from a declaring type name and an operation name
    ///
    /// # Examples
    ///
    /// ```rust
    /// use iris_monitor_perfmon::SpanLabel;
    ///
    /// let label = SpanLabel::new("PatientService", "patientGetInfo").unwrap();
    /// assert_eq!(label.as_str(), "PatientService_patientGetInfo");
    /// ```
    pub fn new(type_name: &str, operation: &str) -> PerfmonResult<Self> {
        Self::parse(format!("{}_{}", type_name, operation))
    }

    /// Build a label from the simple name of `T` and an operation name
    ///
    /// Module paths and generic arguments are dropped, so
    /// `crate::service::PatientService<Store>` becomes `PatientService`.
    pub fn of<T: ?Sized>(operation: &str) -> PerfmonResult<Self> {
        Self::new(simple_type_name::<T>(), operation)
    }

    /// Use a preformatted label as-is
    pub fn parse(label: impl Into<String>) -> PerfmonResult<Self> {
        let label = label.into();
        let valid = !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(PerfmonError::InvalidLabel(label));
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpanLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last path segment of `T`'s type name, without generic arguments
pub fn simple_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Name of the report artifact produced for one profiling session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportName(String);

impl ReportName {
    /// Render the report name for `label` at local time `at`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use iris_monitor_perfmon::{ReportName, SpanLabel};
    ///
    /// let at = NaiveDate::from_ymd_opt(2024, 3, 5)
    ///     .unwrap()
    ///     .and_hms_opt(8, 9, 10)
    ///     .unwrap();
    /// let label = SpanLabel::parse("Foo_bar").unwrap();
    /// assert_eq!(ReportName::new(&label, at).as_str(), "Foo_bar_20240305_080910.txt");
    /// ```
    pub fn new(label: &SpanLabel, at: NaiveDateTime) -> Self {
        Self(format!(
            "{}_{}.{}",
            label,
            at.format(REPORT_TIMESTAMP_FORMAT),
            REPORT_EXTENSION
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of wall-clock time for report names
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
