//! Account-related HTTP API.

pub mod login;
pub mod password;
pub mod register;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::{Router, middleware};

use crate::AppState;
use crate::intake::ID_CARD_MAX_SIZE;

// ID card plus a little slack for the text fields.
const REGISTER_BODY_LIMIT: usize = ID_CARD_MAX_SIZE + 64 * 1024;

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/change-password", post(password::change_handler))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::router::require_auth,
        ));

    Router::new()
        // `POST /auth/register` goes to `register`. Multipart.
        .route(
            "/register",
            post(register::handler)
                .layer(DefaultBodyLimit::max(REGISTER_BODY_LIMIT)),
        )
        // `POST /auth/login` goes to `login`.
        .route("/login", post(login::handler))
        .route("/logout", post(login::logout))
        .route("/forgot-password", post(password::forgot_handler))
        .route("/reset-password", post(password::reset_handler))
        .merge(protected)
}
