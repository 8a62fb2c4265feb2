//! Loan category routes

use axum::{routing::get, Router};

use crate::handlers::categories;
use crate::state::AppState;

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/categories/:id/loans",
            get(categories::list_category_loans).post(categories::create_category_loan),
        )
}
