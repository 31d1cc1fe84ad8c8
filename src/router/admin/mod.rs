//! Administration HTTP API.

pub mod accounts;
pub mod review;

use axum::routing::{get, patch};
use axum::{Router, middleware};

use crate::AppState;
use crate::router::require_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /admin/accounts` for super admins.
        .route("/accounts", get(accounts::list_handler))
        .route("/accounts/{id}/status", patch(accounts::status_handler))
        .route(
            "/accounts/{id}/verify-email",
            patch(accounts::verify_email_handler),
        )
        // Stage queue of the calling reviewer.
        .route("/review/pending", get(review::pending_handler))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
