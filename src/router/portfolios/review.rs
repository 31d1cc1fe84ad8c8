//! Reviewer decisions on the two-stage pipeline.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::portfolio::machine::{self, Actor, ReviewVerdict};
use crate::portfolio::{PortfolioRepository, ReviewState};
use crate::router::{Valid, require_role};
use crate::user::{Caller, Role};

#[derive(Debug, Deserialize, Validate)]
pub struct Body {
    pub action: ReviewVerdict,
    #[validate(length(
        max = 1000,
        message = "Comment must be at most 1000 characters long."
    ))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub id: Uuid,
    pub state: ReviewState,
    pub reject_comment: Option<String>,
}

/// Handler for `approve`/`reject` decisions.
///
/// The state machine only accepts the reviewer whose role matches the
/// portfolio's current stage; anything else is an invalid transition
/// and the record stays untouched. Losing the write race against
/// another reviewer is a conflict the caller may retry.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    require_role(&caller, &[Role::AdvisorAdmin, Role::SuperAdmin])?;

    let repo = PortfolioRepository::new(state.db.postgres.clone());
    let portfolio = repo.find_by_id(id).await?;

    let action = body.action.into_action(body.comment);
    let transition =
        machine::apply(portfolio.state, Actor::Reviewer(caller.role), action)?;
    let portfolio = repo.transition(portfolio.id, &transition).await?;

    tracing::info!(
        portfolio_id = %portfolio.id,
        reviewer_id = %caller.id,
        from = %transition.from,
        to = %portfolio.state,
        "portfolio reviewed"
    );

    Ok(Json(Response {
        id: portfolio.id,
        state: portfolio.state,
        reject_comment: portfolio.reject_comment,
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::*;

    #[tokio::test]
    async fn test_review_requires_auth() {
        let state = test_state().await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::PATCH,
            "/portfolios/3f5e7d00-0000-0000-0000-000000000000/review",
            json!({"action": "approve"}).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
