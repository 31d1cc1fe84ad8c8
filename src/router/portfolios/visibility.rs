//! Visibility toggle for approved portfolios.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::portfolio::{Portfolio, PortfolioRepository, Visibility, policy};
use crate::router::Valid;
use crate::user::Caller;

#[derive(Debug, Deserialize, Validate)]
pub struct Body {
    pub visibility: Visibility,
}

/// Handler to make an approved portfolio public or private.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Valid(body): Valid<Body>,
) -> Result<Json<Portfolio>> {
    let repo = PortfolioRepository::new(state.db.postgres.clone());
    let portfolio = repo.find_by_id(id).await?;

    policy::ensure_can_toggle_visibility(&portfolio, &caller)?;

    let portfolio = repo.set_visibility(portfolio.id, body.visibility).await?;

    Ok(Json(portfolio))
}
