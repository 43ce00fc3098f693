// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # HTTP surface
//!
//! `GET /patient/info?key=<k>` answers with the patient record as JSON.
//!
//! | outcome                           | status |
//! |-----------------------------------|--------|
//! | record found                      | 200    |
//! | no record for key                 | 404    |
//! | `key` missing or blank            | 400    |
//! | profiling session failed to start | 503    |
//! | data backend failed               | 500    |

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use iris_monitor_patient::{PatientError, PatientInfo};
use serde::Deserialize;
use tracing::{error, warn};

use crate::bootstrap::PatientLookup;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    patients: Arc<PatientLookup>,
}

impl AppState {
    pub fn new(patients: PatientLookup) -> Self {
        Self {
            patients: Arc::new(patients),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/patient/info", get(patient_info))
        .with_state(state)
}

/// Query string of `/patient/info`
#[derive(Debug, Default, Deserialize)]
pub struct InfoParams {
    pub key: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

pub async fn patient_info(
    State(state): State<AppState>,
    Query(params): Query<InfoParams>,
) -> ApiResult<Json<PatientInfo>> {
    let key = params
        .key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter 'key' is required"))?;

    state
        .patients
        .patient_get_info(&key)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(&format!("No patient with key '{}'", key)))
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolves when `signal` fires; never resolves if it could not be installed
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        error!(error = %err, "Failed to listen for shutdown signal; Ctrl-C will not stop the server gracefully");
        std::future::pending::<()>().await;
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn not_found(message: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        let status = match &err {
            PatientError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            PatientError::Profiling(e) => {
                warn!(error = %e, "Profiling session unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
            PatientError::QueryFailed(_) | PatientError::ConfigurationError(_) => {
                error!(error = %err, "Patient lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.message
        }));
        (self.status, body).into_response()
    }
}
