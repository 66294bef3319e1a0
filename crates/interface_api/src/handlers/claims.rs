//! Claims handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{ClaimId, LecturerId};
use domain_claims::Caller;

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

fn parse_claim_id(raw: &str) -> Result<ClaimId, ApiError> {
    raw.parse::<ClaimId>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid claim id: {}", raw)))
}

/// Submits a new claim
pub async fn submit_claim(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<SubmitClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    request.validate()?;
    let command = request.into_command()?;
    let claim = state.workflow.submit(&caller, command).await?;
    Ok((StatusCode::CREATED, Json(ClaimResponse::from(&claim))))
}

/// Lists one lecturer's claims, the caller's own by default
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<ListClaimsQuery>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let lecturer_id = match query.lecturer {
        Some(raw) => LecturerId::new(raw).map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => caller.lecturer_id()?,
    };
    let claims = state.workflow.track(&caller, &lecturer_id).await?;
    Ok(Json(claims.iter().map(ClaimResponse::from).collect()))
}

/// Gets a claim by id
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.workflow.get_claim(&caller, parse_claim_id(&id)?).await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Claims waiting on the caller's role
pub async fn review_queue(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.workflow.review_queue(&caller).await?;
    Ok(Json(claims.iter().map(ClaimResponse::from).collect()))
}

pub async fn verify_claim(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    body: Option<Json<VerifyRequest>>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let expected_version = body.and_then(|Json(b)| b.expected_version);
    let claim = state
        .workflow
        .verify(&caller, parse_claim_id(&id)?, expected_version)
        .await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Approves or rejects a claim
pub async fn decide_claim(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state
        .workflow
        .verify_or_reject(
            &caller,
            parse_claim_id(&id)?,
            request.decision.into(),
            request.expected_version,
        )
        .await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Approves every verified claim
pub async fn batch_approve(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<BatchApproveResponse>, ApiError> {
    let report = state.workflow.batch_approve(&caller).await?;
    Ok(Json(BatchApproveResponse::from(&report)))
}
