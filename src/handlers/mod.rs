//! API handlers for the LoanDesk backend

pub mod applications;
pub mod auth;
pub mod categories;
pub mod eligibility;
pub mod form_fields;
pub mod health;
pub mod loans;

pub use crate::middleware::auth::{AdminUser, AuthenticatedUser};
