//! Lecturer directory handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::LecturerId;
use domain_claims::Caller;

use crate::dto::lecturers::*;
use crate::{error::ApiError, AppState};

pub async fn register_lecturer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<RegisterLecturerRequest>,
) -> Result<(StatusCode, Json<LecturerResponse>), ApiError> {
    request.validate()?;
    let lecturer = state
        .workflow
        .register_lecturer(&caller, request.into_command()?)
        .await?;
    Ok((StatusCode::CREATED, Json(LecturerResponse::from(&lecturer))))
}

pub async fn list_lecturers(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<LecturerResponse>>, ApiError> {
    let lecturers = state.workflow.list_lecturers(&caller).await?;
    Ok(Json(lecturers.iter().map(LecturerResponse::from).collect()))
}

/// Updates contact details
pub async fn update_lecturer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(request): Json<UpdateLecturerRequest>,
) -> Result<Json<LecturerResponse>, ApiError> {
    request.validate()?;
    let id = LecturerId::new(id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let lecturer = state
        .workflow
        .update_lecturer(&caller, &id, request.into())
        .await?;
    Ok(Json(LecturerResponse::from(&lecturer)))
}
