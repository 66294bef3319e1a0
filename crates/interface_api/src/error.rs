//! API error handling

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_claims::ClaimError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0:?}")]
    Validation(Vec<String>),

    #[error(transparent)]
    Claim(#[from] ClaimError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// HTTP status for a domain error
pub fn status_for(error: &ClaimError) -> StatusCode {
    match error {
        ClaimError::Validation(_) | ClaimError::FileRejected { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ClaimError::NotFound { .. } => StatusCode::NOT_FOUND,
        ClaimError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        ClaimError::InvalidTransition { .. } | ClaimError::Conflict(_) => StatusCode::CONFLICT,
        ClaimError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ClaimError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "bad_request".to_string(),
                    message: msg,
                    details: None,
                },
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "unauthorized".to_string(),
                    message: "Unauthorized".to_string(),
                    details: None,
                },
            ),
            ApiError::Validation(details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "validation_error".to_string(),
                    message: "Request validation failed".to_string(),
                    details: Some(details),
                },
            ),
            ApiError::Claim(err) => {
                let status = status_for(&err);
                // server-side failures are logged, never echoed
                let details = if status.is_server_error() {
                    error!(error = %err, "Request failed");
                    None
                } else {
                    Some(vec![err.to_string()])
                };
                (
                    status,
                    ErrorResponse {
                        error: err.code().to_string(),
                        message: err.user_message(),
                        details,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::Validation(details)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_statuses() {
        assert_eq!(status_for(&ClaimError::validation("x")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(&ClaimError::not_found("Claim", 1)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&ClaimError::permission_denied("Lecturer", "approve")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&ClaimError::InvalidTransition {
                from: "Approved".to_string(),
                to: "Pending".to_string()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&ClaimError::Conflict("v".to_string())), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&ClaimError::file_rejected("a.exe", "type")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&ClaimError::Unavailable("db".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ClaimError::Internal("sum".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_response_hides_details() {
        let response =
            ApiError::from(ClaimError::Internal("totals off by 0.01".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
