//! Single portfolio detail.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::portfolio::{Portfolio, PortfolioRepository, policy};
use crate::router::MaybeCaller;

/// Handler for portfolio detail, guests included.
///
/// Denied reads answer like missing records so private work cannot be
/// probed by id.
pub async fn handler(
    State(state): State<AppState>,
    Extension(MaybeCaller(caller)): Extension<MaybeCaller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Portfolio>> {
    let portfolio = PortfolioRepository::new(state.db.postgres.clone())
        .find_by_id(id)
        .await?;

    if !policy::can_view(&portfolio, caller.as_ref()) {
        return Err(ServerError::NotFound);
    }

    Ok(Json(portfolio))
}
