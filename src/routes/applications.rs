//! Application routes

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::handlers::applications;
use crate::state::AppState;

/// Multipart submissions get their own body limit
pub fn application_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/applications",
            get(applications::list_applications).post(applications::submit_application),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .route(
            "/api/applications/:id",
            get(applications::get_application).put(applications::update_application),
        )
        .route(
            "/api/applications/:id/approve",
            post(applications::approve_application),
        )
        .route(
            "/api/applications/:id/reject",
            post(applications::reject_application),
        )
}
