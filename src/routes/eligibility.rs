//! Eligibility routes

use axum::{routing::get, Router};

use crate::handlers::eligibility;
use crate::state::AppState;

pub fn eligibility_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/eligibility",
            get(eligibility::list_checks).post(eligibility::submit_check),
        )
        .route("/api/eligibility/:id", get(eligibility::get_check))
}
