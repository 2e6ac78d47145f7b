//! Error taxonomy for the analyzer/privacy pipeline and the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use zk_credentials::error::CircuitError;

/// Pipeline-stage failures. All of these fire before proof construction;
/// nothing here ever reaches a verifier.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fewer records than the component's minimum. Rejected at the analyzer
    /// stage; never reaches circuit packing.
    #[error("insufficient data: needed {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The user's epsilon budget cannot cover the requested disclosure.
    #[error("privacy budget exceeded: requested {requested_milli} milli-epsilon, {remaining_milli} remaining")]
    PrivacyBudgetExceeded {
        requested_milli: u64,
        remaining_milli: u64,
    },

    /// Witness-construction or capacity failures from the circuit crate.
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error("analysis error: {0}")]
    Analysis(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error")]
    Internal,
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InsufficientData { .. }
            | PipelineError::PrivacyBudgetExceeded { .. }
            | PipelineError::Circuit(CircuitError::CapacityExceeded { .. })
            | PipelineError::Circuit(CircuitError::InputRangeViolation { .. }) => {
                ApiError::BadRequest(format!("{e}"))
            }
            _ => ApiError::Internal,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
        };

        (status, Json(ErrorBody { error: msg })).into_response()
    }
}
