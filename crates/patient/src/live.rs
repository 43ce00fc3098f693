// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Live patient store
//!
//! Looks patients up in a table shaped as:
//!
//! ```text
//! patient_key  VARCHAR  -- lookup key
//! name         VARCHAR NULL
//! gender       VARCHAR NULL
//! birth_date   VARCHAR NULL
//! address      VARCHAR NULL
//! ```

use async_trait::async_trait;
use iris_monitor_perfmon::SqlDialect;
use sqlx::AnyPool;
use tracing::debug;

use crate::error::{PatientError, PatientResult};
use crate::record::PatientInfo;
use crate::store::PatientStore;

/// Default patient table name
pub const DEFAULT_PATIENT_TABLE: &str = "patient";

type PatientRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Patient store querying a live database
pub struct LivePatientStore {
    pool: AnyPool,
    query: String,
}

impl LivePatientStore {
    /// Create a store reading from `table`
    ///
    /// # Errors
    ///
    /// Returns `PatientError::ConfigurationError` if `table` is not a plain
    /// (optionally schema-qualified) SQL identifier.
    pub fn new(pool: AnyPool, dialect: SqlDialect, table: &str) -> PatientResult<Self> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            query: lookup_query(table, dialect),
        })
    }

    /// The SQL statement used for lookups
    pub fn query(&self) -> &str {
        &self.query
    }
}

fn lookup_query(table: &str, dialect: SqlDialect) -> String {
    format!(
        "SELECT patient_key, name, gender, birth_date, address FROM {} WHERE patient_key = {}",
        table,
        dialect.placeholder(1)
    )
}

/// Accept `name` or `schema.name` made of ASCII letters, digits and `_`
pub fn validate_table_name(table: &str) -> PatientResult<()> {
    let valid = !table.is_empty()
        && table.split('.').count() <= 2
        && table.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(PatientError::ConfigurationError(format!(
            "invalid patient table name '{}'",
            table
        )))
    }
}

#[async_trait]
impl PatientStore for LivePatientStore {
    async fn fetch(&self, key: &str) -> PatientResult<Option<PatientInfo>> {
        let row = sqlx::query_as::<sqlx::Any, PatientRow>(&self.query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                PatientError::QueryFailed(format!("Failed to fetch patient '{}': {}", key, e))
            })?;

        debug!(key = %key, found = row.is_some(), "Queried patient table");

        Ok(row.map(|(key, name, gender, birth_date, address)| PatientInfo {
            key,
            name,
            gender,
            birth_date,
            address,
        }))
    }
}
