//! Handle database requests for portfolios.
//!
//! Lifecycle writes go through [`PortfolioRepository::transition`],
//! which only applies when the stored state still matches the state
//! the transition was computed from. Losing that check is a conflict,
//! not a silent overwrite.

use serde::Serialize;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::portfolio::catalog::{CatalogFilter, CatalogItem, CatalogPage};
use crate::portfolio::machine::{CommentEffect, Transition};
use crate::portfolio::{Portfolio, ReviewState, Visibility};

const PORTFOLIO_COLUMNS: &str = "id, owner_id, title, description, files, \
     cover_url, category, year, university, tags, award, state, visibility, \
     reject_comment, revision, created_at, updated_at";

/// Stage queue entry shown to reviewers.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PendingReview {
    pub id: Uuid,
    pub title: String,
    pub student_name: String,
    pub revision: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone)]
pub struct PortfolioRepository {
    pool: Pool<Postgres>,
}

impl PortfolioRepository {
    /// Create a new [`PortfolioRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`Portfolio`] into database.
    pub async fn insert(&self, portfolio: &Portfolio) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO portfolios
                (id, owner_id, title, description, files, cover_url,
                 category, year, university, tags, award, state, visibility,
                 reject_comment, revision)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                 $13, $14, $15)"#,
        )
        .bind(portfolio.id)
        .bind(portfolio.owner_id)
        .bind(&portfolio.title)
        .bind(&portfolio.description)
        .bind(&portfolio.files)
        .bind(&portfolio.cover_url)
        .bind(portfolio.category)
        .bind(portfolio.year)
        .bind(&portfolio.university)
        .bind(&portfolio.tags)
        .bind(&portfolio.award)
        .bind(portfolio.state)
        .bind(portfolio.visibility)
        .bind(&portfolio.reject_comment)
        .bind(portfolio.revision)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a portfolio using `id` field.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Portfolio> {
        let query =
            format!("SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE id = $1");

        sqlx::query_as::<_, Portfolio>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }

    /// All portfolios of one owner, newest first.
    pub async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Portfolio>> {
        let query = format!(
            "SELECT {PORTFOLIO_COLUMNS} FROM portfolios
                WHERE owner_id = $1 ORDER BY created_at DESC"
        );

        Ok(sqlx::query_as::<_, Portfolio>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Queue of portfolios waiting on the given review stage.
    pub async fn pending_for(
        &self,
        stage: ReviewState,
    ) -> Result<Vec<PendingReview>> {
        Ok(sqlx::query_as::<_, PendingReview>(
            r#"SELECT p.id, p.title, u.display_name AS student_name,
                 p.revision, p.updated_at AS submitted_at
                FROM portfolios p
                JOIN users u ON u.id = p.owner_id
                WHERE p.state = $1
                ORDER BY p.updated_at ASC"#,
        )
        .bind(stage)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Save owner-editable content fields.
    pub async fn update_content(&self, portfolio: &Portfolio) -> Result<()> {
        sqlx::query(
            r#"UPDATE portfolios
                SET title = $2, description = $3, category = $4, year = $5,
                    university = $6, tags = $7, award = $8, updated_at = NOW()
                WHERE id = $1"#,
        )
        .bind(portfolio.id)
        .bind(&portfolio.title)
        .bind(&portfolio.description)
        .bind(portfolio.category)
        .bind(portfolio.year)
        .bind(&portfolio.university)
        .bind(&portfolio.tags)
        .bind(&portfolio.award)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply a computed [`Transition`] with an optimistic from-state check.
    ///
    /// Returns the updated record, [`ServerError::Conflict`] when another
    /// writer moved the portfolio first, or [`ServerError::NotFound`].
    pub async fn transition(
        &self,
        id: Uuid,
        transition: &Transition,
    ) -> Result<Portfolio> {
        let (keep_comment, comment) = match &transition.comment {
            CommentEffect::Keep => (true, None),
            CommentEffect::Clear => (false, None),
            CommentEffect::Set(comment) => (false, Some(comment.clone())),
        };

        let query = format!(
            r#"UPDATE portfolios
                SET state = $2,
                    reject_comment = CASE WHEN $3 THEN reject_comment
                                          ELSE $4 END,
                    revision = revision + $5,
                    updated_at = NOW()
                WHERE id = $1 AND state = $6
                RETURNING {PORTFOLIO_COLUMNS}"#
        );

        let updated = sqlx::query_as::<_, Portfolio>(&query)
            .bind(id)
            .bind(transition.to)
            .bind(keep_comment)
            .bind(comment)
            .bind(i32::from(transition.bump_revision))
            .bind(transition.from)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(portfolio) => Ok(portfolio),
            None => {
                // The row exists but already moved on, or never existed.
                self.find_by_id(id).await?;
                Err(ServerError::Conflict(
                    "portfolio review state changed concurrently",
                ))
            },
        }
    }

    /// Toggle visibility of an approved portfolio.
    ///
    /// The `APPROVED` check is repeated at write time so a concurrent
    /// rejection cannot be raced into a public record.
    pub async fn set_visibility(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Portfolio> {
        let query = format!(
            r#"UPDATE portfolios SET visibility = $2, updated_at = NOW()
                WHERE id = $1 AND state = 'APPROVED'
                RETURNING {PORTFOLIO_COLUMNS}"#
        );

        let updated = sqlx::query_as::<_, Portfolio>(&query)
            .bind(id)
            .bind(visibility)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(portfolio) => Ok(portfolio),
            None => {
                self.find_by_id(id).await?;
                Err(ServerError::NotApproved)
            },
        }
    }

    /// Run the public catalog query: approved and public records only,
    /// newest first, with a total count for pagination.
    pub async fn catalog(&self, filter: &CatalogFilter) -> Result<CatalogPage> {
        let mut query = QueryBuilder::new(
            "SELECT p.id, p.title, p.description, p.year, p.category, \
                p.university, u.display_name AS student_name, p.cover_url \
                FROM portfolios p JOIN users u ON u.id = p.owner_id",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let items = query
            .build_query_as::<CatalogItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::new(
            "SELECT COUNT(*) FROM portfolios p \
                JOIN users u ON u.id = p.owner_id",
        );
        push_filters(&mut count, filter);
        let total: i64 =
            count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(CatalogPage {
            page: filter.page,
            limit: filter.limit,
            total,
            items,
        })
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &CatalogFilter) {
    query
        .push(" WHERE p.state = ")
        .push_bind(ReviewState::Approved)
        .push(" AND p.visibility = ")
        .push_bind(Visibility::Public);

    if let Some(pattern) = filter.keyword_pattern() {
        query
            .push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR array_to_string(p.tags, ' ') ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(year) = filter.year {
        query.push(" AND p.year = ").push_bind(year);
    }
    if let Some(category) = filter.category {
        query.push(" AND p.category = ").push_bind(category);
    }
    if let Some(university) = &filter.university {
        query.push(" AND p.university = ").push_bind(university.clone());
    }
    if !filter.tags.is_empty() {
        query.push(" AND p.tags @> ").push_bind(filter.tags.clone());
    }
}
