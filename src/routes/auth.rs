//! Authentication routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::middleware::{throttle, RateLimiter};
use crate::state::AppState;

/// OTP endpoints are throttled per client
pub fn auth_routes(limiter: RateLimiter) -> Router<AppState> {
    Router::new()
        .route("/api/auth/send-otp", post(auth::send_otp))
        .route("/api/auth/verify-otp", post(auth::verify_otp))
        .route_layer(middleware::from_fn_with_state(limiter, throttle))
        .route("/api/auth/me", get(auth::get_current_user))
}
