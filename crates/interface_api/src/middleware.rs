//! API middleware

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use chrono::Utc;
use tracing::{info, warn};

use domain_claims::Caller;

use crate::auth::{caller_from_claims, validate_token};
use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// Validates the bearer token and stores the resolved [`Caller`] in the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            warn!("Missing or invalid Authorization header");
            ApiError::Unauthorized
        })?;

    let caller = validate_token(token, &state.config.jwt_secret)
        .and_then(|claims| caller_from_claims(&claims))
        .map_err(|e| {
            warn!(error = %e, "Token rejected");
            ApiError::Unauthorized
        })?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Audit logging middleware
///
/// Logs every API request with the caller and outcome
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let (user, role) = request
        .extensions()
        .get::<Caller>()
        .map(|c| (c.identity.clone(), c.role.as_str()))
        .unwrap_or_else(|| ("anonymous".to_string(), "-"));

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user,
        role = role,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
