//! Review stage queues.

use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::portfolio::{PendingReview, PortfolioRepository, ReviewState};
use crate::user::{Caller, Role};

/// Handler returning the queue waiting on the caller's stage:
/// `ADMIN_PENDING` for advisors, `SUPER_PENDING` for super admins.
pub async fn pending_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<PendingReview>>> {
    let stage = match caller.role {
        Role::AdvisorAdmin => ReviewState::AdminPending,
        Role::SuperAdmin => ReviewState::SuperPending,
        Role::Student | Role::Recruiter => {
            return Err(ServerError::Forbidden("role not allowed"));
        },
    };

    let queue = PortfolioRepository::new(state.db.postgres.clone())
        .pending_for(stage)
        .await?;

    Ok(Json(queue))
}
