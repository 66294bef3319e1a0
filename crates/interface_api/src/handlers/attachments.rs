//! Attachment upload handler

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};

use domain_claims::{Caller, Upload};

use crate::dto::attachments::UploadResponse;
use crate::{error::ApiError, AppState};

/// Stores every file part of a multipart upload
///
/// Files are accepted or rejected one by one; the response lists both.
pub async fn upload_attachments(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        uploads.push(Upload::new(file_name, bytes.to_vec()));
    }
    if uploads.is_empty() {
        return Err(ApiError::BadRequest("No files in upload".to_string()));
    }

    let report = state.workflow.store_attachments(&caller, uploads).await?;
    Ok(Json(UploadResponse::from(report)))
}
