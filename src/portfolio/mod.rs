//! Portfolio lifecycle: data model, review state machine, visibility
//! policy and public catalog query.

pub mod catalog;
pub mod machine;
pub mod policy;
mod repository;

pub use repository::*;

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bounds accepted for the `year` field.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 2015..=2030;

/// Upload count accepted per portfolio.
pub const MAX_FILES: usize = 10;

/// Affiliation used when the student provides none.
pub const DEFAULT_UNIVERSITY: &str = "KMUTT";

/// Review lifecycle state, the single canonical field.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "review_state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Draft,
    AdminPending,
    SuperPending,
    Approved,
    Rejected,
}

impl ReviewState {
    /// States in which the owner may still edit content.
    pub fn editable(&self) -> bool {
        matches!(
            self,
            ReviewState::Draft
                | ReviewState::Rejected
                | ReviewState::AdminPending
        )
    }
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ReviewState::Draft => write!(f, "DRAFT"),
            ReviewState::AdminPending => write!(f, "ADMIN_PENDING"),
            ReviewState::SuperPending => write!(f, "SUPER_PENDING"),
            ReviewState::Approved => write!(f, "APPROVED"),
            ReviewState::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Who can read an approved portfolio.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(
    type_name = "portfolio_visibility",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Visibility {
    Public,
    Private,
}

/// Closed set of portfolio categories.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "portfolio_category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Ai,
    Design,
    Engineering,
    Research,
    Art,
    General,
}

/// Portfolio as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Portfolio {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub files: Vec<String>,
    pub cover_url: String,
    pub category: Category,
    pub year: i32,
    pub university: String,
    pub tags: Vec<String>,
    pub award: Option<String>,
    pub state: ReviewState,
    pub visibility: Visibility,
    pub reject_comment: Option<String>,
    pub revision: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
