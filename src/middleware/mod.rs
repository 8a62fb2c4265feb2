//! Middleware for the LoanDesk API
//!
//! Request tracing, OTP throttling, security headers and the
//! authentication extractors.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use auth::{AdminUser, AuthenticatedUser};
pub use rate_limiter::{throttle, RateLimiter};
pub use security::{hsts_header, security_headers};
pub use tracing::request_tracing;
