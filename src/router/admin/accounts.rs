//! Super-admin account review.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{Valid, require_role};
use crate::user::{AccountStatus, Caller, Role, User, UserRepository};

/// Account decision sent by the admin front-end.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountDecision {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusBody {
    pub action: AccountDecision,
}

/// Handler listing accounts awaiting review (non-admin accounts only).
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<User>>> {
    require_role(&caller, &[Role::SuperAdmin])?;

    let users = UserRepository::new(state.db.postgres.clone())
        .list_applicants()
        .await?;

    Ok(Json(users))
}

/// Handler to approve or reject an account.
pub async fn status_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Valid(body): Valid<StatusBody>,
) -> Result<StatusCode> {
    require_role(&caller, &[Role::SuperAdmin])?;

    let status = match body.action {
        AccountDecision::Approve => AccountStatus::Approved,
        AccountDecision::Reject => AccountStatus::Rejected,
    };
    UserRepository::new(state.db.postgres.clone())
        .update_status(id, status)
        .await?;

    tracing::info!(user_id = %id, ?status, "account status updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Handler to mark an account's email as verified.
pub async fn verify_email_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    require_role(&caller, &[Role::SuperAdmin])?;

    UserRepository::new(state.db.postgres.clone())
        .set_email_verified(id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
