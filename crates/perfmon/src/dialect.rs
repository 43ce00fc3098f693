// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQL dialect detection for live backends.

use crate::error::{PerfmonError, PerfmonResult};

/// SQL dialect spoken by the datasource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    MySql,
    PostgreSql,
}

impl SqlDialect {
    /// Detect the dialect from a connection URL scheme
    pub fn from_url(url: &str) -> PerfmonResult<Self> {
        let scheme = url.split("://").next().unwrap_or_default();
        match scheme {
            "mysql" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" => Ok(SqlDialect::PostgreSql),
            _ if !url.contains("://") => Err(PerfmonError::ConfigurationError(
                "connection url is missing a scheme (e.g. mysql://, postgres://)".to_string(),
            )),
            other => Err(PerfmonError::ConfigurationError(format!(
                "unsupported connection scheme '{}'",
                other
            ))),
        }
    }

    /// Bind placeholder for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::MySql => "?".to_string(),
            SqlDialect::PostgreSql => format!("${}", index),
        }
    }
}

/// Name of the engine class whose methods are projected as SQL routines
///
/// A class `a.b.C` exposes method `m` as routine `a_b.C_m`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureClass {
    schema: Option<String>,
    class: String,
}

/// Profiler procedure class installed alongside the monitor
pub const DEFAULT_PROCEDURE_CLASS: &str = "iris.src.dc.AdapterPerfmonProc";

impl ProcedureClass {
    pub fn parse(qualified: &str) -> PerfmonResult<Self> {
        let segments: Vec<&str> = qualified.split('.').collect();
        let valid = segments.iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(PerfmonError::ConfigurationError(format!(
                "invalid procedure class '{}'",
                qualified
            )));
        }

        let (class, package) = segments.split_last().ok_or_else(|| {
            PerfmonError::ConfigurationError("procedure class cannot be empty".to_string())
        })?;
        let schema = (!package.is_empty()).then(|| package.join("_"));

        Ok(Self {
            schema,
            class: class.to_string(),
        })
    }

    /// SQL routine name for `method`
    pub fn routine(&self, method: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}_{}", schema, self.class, method),
            None => format!("{}_{}", self.class, method),
        }
    }
}

impl Default for ProcedureClass {
    fn default() -> Self {
        Self {
            schema: Some("iris_src_dc".to_string()),
            class: "AdapterPerfmonProc".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_mysql_url() {
        let dialect = SqlDialect::from_url("mysql://user:pw@localhost:3306/db").unwrap();
        assert_eq!(dialect, SqlDialect::MySql);
    }

    #[test]
    fn test_dialect_from_postgres_urls() {
        assert_eq!(
            SqlDialect::from_url("postgres://localhost/db").unwrap(),
            SqlDialect::PostgreSql
        );
        assert_eq!(
            SqlDialect::from_url("postgresql://localhost/db").unwrap(),
            SqlDialect::PostgreSql
        );
    }

    #[test]
    fn test_dialect_rejects_missing_scheme() {
        assert!(SqlDialect::from_url("localhost:3306").is_err());
    }

    #[test]
    fn test_dialect_rejects_unknown_scheme() {
        let err = SqlDialect::from_url("jdbc:IRIS://localhost:1972/USER").unwrap_err();
        assert!(err.to_string().contains("jdbc:IRIS"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(SqlDialect::MySql.placeholder(1), "?");
        assert_eq!(SqlDialect::PostgreSql.placeholder(2), "$2");
    }

    #[test]
    fn test_default_procedure_class_routines() {
        let class = ProcedureClass::parse(DEFAULT_PROCEDURE_CLASS).unwrap();
        assert_eq!(class, ProcedureClass::default());
        assert_eq!(class.routine("start"), "iris_src_dc.AdapterPerfmonProc_start");
        assert_eq!(
            class.routine("generateReport"),
            "iris_src_dc.AdapterPerfmonProc_generateReport"
        );
    }

    #[test]
    fn test_procedure_class_without_package() {
        let class = ProcedureClass::parse("Perfmon").unwrap();
        assert_eq!(class.routine("stop"), "Perfmon_stop");
    }

    #[test]
    fn test_procedure_class_rejects_bad_segments() {
        assert!(ProcedureClass::parse("").is_err());
        assert!(ProcedureClass::parse("iris..Proc").is_err());
        assert!(ProcedureClass::parse("iris.Proc; DROP TABLE x").is_err());
    }
}
