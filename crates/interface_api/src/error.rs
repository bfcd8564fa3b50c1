//! API error handling
//!
//! Engine errors keep their taxonomy on the wire: the `error` field of the
//! response body names the kind and the HTTP status follows it.

use app_booking::EngineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    InvalidBody(#[from] ValidationErrors),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    fn parts(&self) -> (StatusCode, &'static str, Option<Vec<String>>) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            ApiError::InvalidBody(errors) => {
                let details = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errs)| {
                        errs.iter().map(move |e| format!("{field}: {}", e.code))
                    })
                    .collect();
                (StatusCode::BAD_REQUEST, "validation_error", Some(details))
            }
            ApiError::Engine(err) => match err {
                EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error", None),
                EngineError::Conflict { .. } => (StatusCode::CONFLICT, "conflict", None),
                EngineError::QuotaExceeded {
                    used,
                    remaining,
                    quota,
                } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "quota_exceeded",
                    Some(vec![
                        format!("used: {used}"),
                        format!("remaining: {remaining}"),
                        format!("quota: {quota}"),
                    ]),
                ),
                EngineError::InvalidTransition { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", None)
                }
                EngineError::InvoiceLocked { .. } => (StatusCode::CONFLICT, "invoice_locked", None),
                EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", None),
                EngineError::PartialBatch { committed, .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "partial_batch",
                    Some(vec![format!("committed: {committed}")]),
                ),
                EngineError::PartialCancellation { cancelled, .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "partial_cancellation",
                    Some(vec![format!("cancelled: {cancelled}")]),
                ),
                EngineError::Store(port) if port.is_transient() => {
                    (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", None)
                }
                EngineError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, details) = self.parts();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PortError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_engine_error_statuses() {
        let cases = [
            (EngineError::validation("a date must be selected"), StatusCode::BAD_REQUEST),
            (
                EngineError::QuotaExceeded {
                    used: dec!(5),
                    remaining: dec!(0),
                    quota: dec!(5),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                EngineError::NotFound {
                    entity_type: "Booking".into(),
                    id: "BKG-1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (EngineError::Store(PortError::connection("down")), StatusCode::SERVICE_UNAVAILABLE),
            (EngineError::Store(PortError::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_quota_details() {
        let (_, kind, details) = ApiError::from(EngineError::QuotaExceeded {
            used: dec!(4.5),
            remaining: dec!(0.5),
            quota: dec!(5),
        })
        .parts();
        assert_eq!(kind, "quota_exceeded");
        assert_eq!(details.unwrap()[1], "remaining: 0.5");
    }

    #[test]
    fn test_partial_cancellation_details() {
        let (status, kind, details) = ApiError::from(EngineError::PartialCancellation {
            cancelled: 3,
            source: PortError::connection("down"),
        })
        .parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "partial_cancellation");
        assert_eq!(details.unwrap(), vec!["cancelled: 3".to_string()]);
    }
}
