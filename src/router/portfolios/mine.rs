//! Owner's portfolio list.

use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::portfolio::{Portfolio, PortfolioRepository};
use crate::router::require_role;
use crate::user::{Caller, Role};

/// Handler returning all portfolios of the calling student,
/// newest first, whatever their state.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Portfolio>>> {
    require_role(&caller, &[Role::Student])?;

    let portfolios = PortfolioRepository::new(state.db.postgres.clone())
        .find_by_owner(caller.id)
        .await?;

    Ok(Json(portfolios))
}
