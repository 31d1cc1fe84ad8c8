//! Portfolio creation with file uploads.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Extension;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::Result;
use crate::portfolio::{
    Category, DEFAULT_UNIVERSITY, MAX_FILES, Portfolio, PortfolioRepository,
    ReviewState, SUPPORTED_YEARS, Visibility,
};
use crate::router::{parse_enum, require_role};
use crate::user::{Caller, Role, User};

#[derive(Debug, Default, Validate)]
struct Form {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be 1 to 200 characters long."
    ))]
    title: String,
    #[validate(length(
        max = 2000,
        message = "Description must be at most 2000 characters long."
    ))]
    description: String,
    university: Option<String>,
    tags: Vec<String>,
    award: Option<String>,
    draft: bool,
}

fn invalid(field: &'static str, message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new(field).with_message(message.into()),
    );
    errors
}

pub(super) fn check_year(year: i32) -> Result<()> {
    if SUPPORTED_YEARS.contains(&year) {
        Ok(())
    } else {
        Err(invalid("year", "Year is outside the supported range.").into())
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_owned())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Handler to create a portfolio.
///
/// Every upload is validated, then durably written, before the record
/// referencing it is inserted.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Portfolio>)> {
    require_role(&caller, &[Role::Student])?;

    let mut form = Form::default();
    let mut category_raw = String::new();
    let mut year_raw = String::new();
    let mut uploads: Vec<(Option<String>, Option<String>, Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "title" => form.title = field.text().await?,
            "description" => form.description = field.text().await?,
            "category" => category_raw = field.text().await?,
            "year" => year_raw = field.text().await?,
            "university" => form.university = Some(field.text().await?),
            "tags" => form.tags = split_tags(&field.text().await?),
            "award" => form.award = Some(field.text().await?),
            "draft" => form.draft = field.text().await? == "true",
            "files" => {
                let filename = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                uploads.push((filename, content_type, field.bytes().await?));
            },
            _ => {},
        }
    }

    form.validate()?;

    let Some(category) = parse_enum::<Category>(&category_raw) else {
        return Err(invalid("category", "Unknown category.").into());
    };
    let year = year_raw
        .parse::<i32>()
        .map_err(|_| invalid("year", "Year must be a number."))?;
    check_year(year)?;

    if uploads.is_empty() {
        return Err(invalid("files", "At least 1 file is required.").into());
    }
    if uploads.len() > MAX_FILES {
        return Err(invalid("files", "At most 10 files can be uploaded.").into());
    }

    // Refuse the whole batch before writing anything.
    for (filename, content_type, bytes) in &uploads {
        state.uploads.check(
            filename.as_deref(),
            content_type.as_deref(),
            bytes.len(),
        )?;
    }

    let mut files = Vec::with_capacity(uploads.len());
    for (filename, content_type, bytes) in &uploads {
        files.push(
            state
                .uploads
                .store(filename.as_deref(), content_type.as_deref(), bytes)
                .await?,
        );
    }

    let portfolio = Portfolio {
        id: Uuid::new_v4(),
        owner_id: caller.id,
        title: form.title,
        description: form.description,
        cover_url: files[0].clone(),
        files,
        category,
        year,
        university: form
            .university
            .or(user.university)
            .unwrap_or_else(|| DEFAULT_UNIVERSITY.to_owned()),
        tags: form.tags,
        award: form.award,
        state: if form.draft {
            ReviewState::Draft
        } else {
            ReviewState::AdminPending
        },
        visibility: Visibility::Private,
        reject_comment: None,
        revision: 0,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    PortfolioRepository::new(state.db.postgres.clone())
        .insert(&portfolio)
        .await?;

    tracing::info!(
        portfolio_id = %portfolio.id,
        owner_id = %portfolio.owner_id,
        state = %portfolio.state,
        "portfolio created"
    );

    Ok((StatusCode::CREATED, Json(portfolio)))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    #[test]
    fn test_check_year_bounds() {
        assert!(check_year(2024).is_ok());
        assert!(check_year(*SUPPORTED_YEARS.start()).is_ok());
        assert!(check_year(*SUPPORTED_YEARS.end()).is_ok());
        assert!(check_year(1999).is_err());
        assert!(check_year(2077).is_err());
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(
            split_tags("AI, Design ,,photo "),
            vec!["AI".to_owned(), "Design".to_owned(), "photo".to_owned()]
        );
        assert!(split_tags("  ").is_empty());
    }
}
