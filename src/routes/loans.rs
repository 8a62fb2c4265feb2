//! Loan catalog routes

use axum::{routing::get, Router};

use crate::handlers::loans;
use crate::state::AppState;

/// `GET /api/loans/:id` takes a slug; PUT and DELETE take the loan id
pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/api/loans/type/:loan_type", get(loans::list_loans_by_type))
        .route(
            "/api/loans/:id",
            get(loans::get_loan)
                .put(loans::update_loan)
                .delete(loans::delete_loan),
        )
        .route("/api/loans/:id/emi", get(loans::emi_preview))
}
