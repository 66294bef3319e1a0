//! Invoice handler

use axum::{extract::State, Extension, Json};

use domain_claims::Caller;

use crate::dto::invoices::InvoiceResponse;
use crate::{error::ApiError, AppState};

/// Invoice over all approved claims
pub async fn generate_invoice(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let report = state.workflow.generate_invoice(&caller).await?;
    Ok(Json(InvoiceResponse::from(&report)))
}
