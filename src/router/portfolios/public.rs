//! Public catalog search.

use axum::Json;
use axum::extract::{Query, State};

use crate::AppState;
use crate::error::Result;
use crate::portfolio::PortfolioRepository;
use crate::portfolio::catalog::{CatalogPage, CatalogQuery};

/// Handler for the recruiter/guest catalog.
///
/// Only approved, public portfolios ever leave this endpoint,
/// whatever filters are passed.
pub async fn handler(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogPage>> {
    let filter = query.normalize();

    let page = PortfolioRepository::new(state.db.postgres.clone())
        .catalog(&filter)
        .await?;

    Ok(Json(page))
}
