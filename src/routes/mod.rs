//! Route definitions for the LoanDesk API

mod applications;
mod auth;
mod categories;
mod eligibility;
mod form_fields;
mod loans;

use axum::{routing::get, Router};

pub use applications::application_routes;
pub use auth::auth_routes;
pub use categories::category_routes;
pub use eligibility::eligibility_routes;
pub use form_fields::form_field_routes;
pub use loans::loan_routes;

use crate::handlers::health::health_check;
use crate::middleware;
use crate::state::AppState;

/// Every API route with request tracing and security headers
///
/// CORS and static upload serving are added by the binary.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes(state.otp_limiter.clone()))
        .merge(loan_routes())
        .merge(category_routes())
        .merge(form_field_routes())
        .merge(application_routes(state.max_upload_bytes))
        .merge(eligibility_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
