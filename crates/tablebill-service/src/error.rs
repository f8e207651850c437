//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use tablebill_core::BillingError;
use tablebill_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The billing request was rejected; nothing was changed.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Conflict(_) => "conflict",
            Self::Billing(err) => billing_code(err),
            Self::Internal(_) => "internal_error",
        }
    }
}

fn billing_code(err: &BillingError) -> &'static str {
    match err {
        BillingError::UnknownPlan { .. } => "unknown_plan",
        BillingError::UnknownCurrency { .. } => "unknown_currency",
        BillingError::InvalidPeriod { .. } => "invalid_period",
        BillingError::InvalidCurrency(_) => "invalid_currency",
        BillingError::InvalidCatalog(_) => "invalid_catalog",
        BillingError::InvalidId(_) => "invalid_id",
    }
}

fn billing_details(err: &BillingError) -> Option<serde_json::Value> {
    match err {
        BillingError::UnknownPlan { plan_id } => Some(serde_json::json!({ "plan_id": plan_id })),
        BillingError::UnknownCurrency { plan_id, currency } => Some(serde_json::json!({
            "plan_id": plan_id,
            "currency": currency
        })),
        BillingError::InvalidPeriod { start, end } => Some(serde_json::json!({
            "period_start": start.to_rfc3339(),
            "period_end": end.to_rfc3339()
        })),
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message, details) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            Self::Billing(err) => {
                tracing::info!(code = code, error = %err, "Billing request rejected");
                (StatusCode::BAD_REQUEST, err.to_string(), billing_details(err))
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RevisionConflict { .. } => Self::Conflict(format!(
                "subscription changed concurrently, reload and retry ({err})"
            )),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
