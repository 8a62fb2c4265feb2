//! Form field routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::form_fields;
use crate::state::AppState;

pub fn form_field_routes() -> Router<AppState> {
    Router::new()
        .route("/api/form-fields", post(form_fields::create_field))
        .route(
            "/api/form-fields/:id",
            put(form_fields::update_field).delete(form_fields::delete_field),
        )
        .route(
            "/api/form-fields/category/:category_id",
            get(form_fields::list_category_fields),
        )
        .route(
            "/api/form-fields/loan/:loan_id",
            get(form_fields::list_loan_fields),
        )
        .route(
            "/api/form-fields/loan/:loan_id/render",
            get(form_fields::render_loan_fields),
        )
}
