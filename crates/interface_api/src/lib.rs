//! HTTP API Layer
//!
//! REST surface of the lecturer claims workflow, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: thin adapters from HTTP onto [`WorkflowService`]
//! - **Middleware**: bearer-token authentication and audit logging
//! - **DTOs**: request/response bodies
//! - **Error Handling**: domain errors mapped onto status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(workflow, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_claims::WorkflowService;

use crate::config::ApiConfig;
use crate::handlers::{attachments, claims, health, invoices, lecturers};
use crate::middleware::{audit_middleware, auth_middleware};

/// Largest multipart body accepted by the upload route
pub const MAX_UPLOAD_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WorkflowService>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(workflow: WorkflowService, config: ApiConfig) -> Self {
        Self {
            workflow: Arc::new(workflow),
            config,
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Workflow service and configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claims_routes = Router::new()
        .route("/", post(claims::submit_claim).get(claims::list_claims))
        .route("/queue", get(claims::review_queue))
        .route("/batch-approve", post(claims::batch_approve))
        .route("/:id", get(claims::get_claim))
        .route("/:id/verify", post(claims::verify_claim))
        .route("/:id/decision", post(claims::decide_claim));

    let attachment_routes = Router::new()
        .route("/", post(attachments::upload_attachments))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES));

    let lecturer_routes = Router::new()
        .route("/", post(lecturers::register_lecturer).get(lecturers::list_lecturers))
        .route("/:id", put(lecturers::update_lecturer));

    // Protected API routes; auth runs first so the audit log sees the caller
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .nest("/attachments", attachment_routes)
        .route("/invoices", get(invoices::generate_invoice))
        .nest("/lecturers", lecturer_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
