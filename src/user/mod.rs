mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to a [`User`], exactly one, assigned at creation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Recruiter,
    AdvisorAdmin,
    SuperAdmin,
}

impl Role {
    /// Roles a visitor may pick at self-registration.
    /// Admin roles are only created by startup bootstrap.
    pub fn self_registrable(&self) -> bool {
        matches!(self, Role::Student | Role::Recruiter)
    }

    /// Whether this role takes part in the review pipeline.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::AdvisorAdmin | Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "STUDENT"),
            Role::Recruiter => write!(f, "RECRUITER"),
            Role::AdvisorAdmin => write!(f, "ADVISOR_ADMIN"),
            Role::SuperAdmin => write!(f, "SUPER_ADMIN"),
        }
    }
}

/// Account review status, transitioned only by a super admin.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "account_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Pending,
    Approved,
    Rejected,
}

/// User as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub email_verified: bool,
    pub university: Option<String>,
    pub organization: Option<String>,
    pub id_card_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Authenticated identity resolved from a bearer token.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}
