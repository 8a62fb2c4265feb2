//! LoanDesk Backend Library
//!
//! Loan origination: catalog, dynamic application forms, OTP verification,
//! application intake and admin review.

pub mod application;
pub mod auth;
pub mod blob;
pub mod catalog;
pub mod config;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod otp;
pub mod routes;
pub mod state;
pub mod store;
pub mod util;

pub use routes::api_router;
pub use state::AppState;
