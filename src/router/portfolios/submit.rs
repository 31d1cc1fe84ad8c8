//! Send a draft (or rejected) portfolio into the review pipeline.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::portfolio::machine::{self, Action, Actor};
use crate::portfolio::{Portfolio, PortfolioRepository};
use crate::router::require_role;
use crate::user::{Caller, Role};

fn missing_files() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "files",
        ValidationError::new("files")
            .with_message("At least 1 file is required before submit.".into()),
    );
    errors
}

/// Handler to submit a portfolio for review.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Portfolio>> {
    require_role(&caller, &[Role::Student])?;

    let repo = PortfolioRepository::new(state.db.postgres.clone());
    let portfolio = repo.find_by_id(id).await?;

    if portfolio.owner_id != caller.id {
        return Err(ServerError::Forbidden("not your portfolio"));
    }
    // Content is checked at the boundary, the machine only moves states.
    if portfolio.files.is_empty() {
        return Err(missing_files().into());
    }

    let transition =
        machine::apply(portfolio.state, Actor::Owner, Action::Submit)?;
    let portfolio = repo.transition(portfolio.id, &transition).await?;

    tracing::info!(
        portfolio_id = %portfolio.id,
        state = %portfolio.state,
        revision = portfolio.revision,
        "portfolio submitted"
    );

    Ok(Json(portfolio))
}
