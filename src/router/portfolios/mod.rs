//! Portfolio-related HTTP API.

pub mod create;
pub mod get;
pub mod mine;
pub mod public;
pub mod review;
pub mod submit;
pub mod update;
pub mod visibility;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::{Router, middleware};

use crate::AppState;
use crate::intake::PORTFOLIO_MAX_SIZE;
use crate::portfolio::MAX_FILES;
use crate::router::{optional_auth, require_auth};

// Ten files plus a little slack for the text fields.
const CREATE_BODY_LIMIT: usize = MAX_FILES * PORTFOLIO_MAX_SIZE + 64 * 1024;

pub fn router(state: AppState) -> Router<AppState> {
    // Guests may browse the catalog and approved public records.
    let open = Router::new()
        // `GET /portfolios/public` goes to the catalog query.
        .route("/public", get(public::handler))
        .route("/{id}", get(get::handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth,
        ));

    let owned = Router::new()
        // `POST /portfolios` goes to `create`. Multipart, 1 to 10 files.
        .route(
            "/",
            post(create::handler)
                .layer(DefaultBodyLimit::max(CREATE_BODY_LIMIT)),
        )
        .route("/mine", get(mine::handler))
        .route("/{id}", patch(update::handler))
        .route("/{id}/submit", post(submit::handler))
        .route("/{id}/visibility", patch(visibility::handler))
        // `PATCH /portfolios/:ID/review` for the stage's reviewer.
        .route("/{id}/review", patch(review::handler))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    open.merge(owned)
}
