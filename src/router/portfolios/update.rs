//! Owner content edits.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;
use validator::Validate;
use serde::Deserialize;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::portfolio::machine::{self, Action, Actor};
use crate::portfolio::{Category, Portfolio, PortfolioRepository, ReviewState};
use crate::router::{Valid, require_role};
use crate::user::{Caller, Role};

#[derive(Debug, Deserialize, Validate)]
pub struct Body {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be 1 to 200 characters long."
    ))]
    pub title: Option<String>,
    #[validate(length(
        max = 2000,
        message = "Description must be at most 2000 characters long."
    ))]
    pub description: Option<String>,
    pub category: Option<Category>,
    pub year: Option<i32>,
    pub university: Option<String>,
    pub tags: Option<Vec<String>>,
    pub award: Option<String>,
}

/// Handler to edit portfolio content while it is editable.
///
/// Editing a rejected portfolio re-submits it: the reject comment is
/// cleared and the revision counter moves, per the review table.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Valid(body): Valid<Body>,
) -> Result<Json<Portfolio>> {
    require_role(&caller, &[Role::Student])?;

    let repo = PortfolioRepository::new(state.db.postgres.clone());
    let mut portfolio = repo.find_by_id(id).await?;

    if portfolio.owner_id != caller.id {
        return Err(ServerError::Forbidden("not your portfolio"));
    }
    if !portfolio.state.editable() {
        return Err(ServerError::InvalidTransition {
            state: portfolio.state,
            action: "edit",
        });
    }

    if let Some(year) = body.year {
        super::create::check_year(year)?;
        portfolio.year = year;
    }
    if let Some(title) = body.title {
        portfolio.title = title;
    }
    if let Some(description) = body.description {
        portfolio.description = description;
    }
    if let Some(category) = body.category {
        portfolio.category = category;
    }
    if let Some(university) = body.university {
        portfolio.university = university;
    }
    if let Some(tags) = body.tags {
        portfolio.tags = tags;
    }
    if let Some(award) = body.award {
        portfolio.award = Some(award);
    }

    repo.update_content(&portfolio).await?;

    if portfolio.state == ReviewState::Rejected {
        let transition =
            machine::apply(portfolio.state, Actor::Owner, Action::Submit)?;
        portfolio = repo.transition(portfolio.id, &transition).await?;

        tracing::info!(
            portfolio_id = %portfolio.id,
            revision = portfolio.revision,
            "rejected portfolio resubmitted"
        );
    }

    Ok(Json(portfolio))
}
