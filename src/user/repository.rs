//! Handle database requests for users.

use rand::RngCore;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::user::{AccountStatus, Role, User};

const RESET_TOKEN_VALIDITY_MIN: i64 = 15;

const USER_COLUMNS: &str = "id, display_name, email, password_hash, role, \
     status, email_verified, university, organization, id_card_url, \
     created_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database.
    ///
    /// Emails are unique, a duplicate registration is a conflict.
    pub async fn insert(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"INSERT INTO users
                (id, display_name, email, password_hash, role, status,
                 email_verified, university, organization, id_card_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(user.id)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.status)
        .bind(user.email_verified)
        .bind(&user.university)
        .bind(&user.organization)
        .bind(&user.id_card_url)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_database_error()
                    .is_some_and(|e| e.is_unique_violation()) =>
            {
                Err(ServerError::Conflict("email already registered"))
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// List non-admin accounts for the super-admin review screen.
    pub async fn list_applicants(&self) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users
                WHERE role NOT IN ('ADVISOR_ADMIN', 'SUPER_ADMIN')
                ORDER BY created_at DESC"
        );

        Ok(sqlx::query_as::<_, User>(&query).fetch_all(&self.pool).await?)
    }

    /// Approve or reject an account.
    pub async fn update_status(
        &self,
        user_id: Uuid,
        status: AccountStatus,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE users SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound);
        }
        Ok(())
    }

    /// Mark an account email as verified by a super admin.
    pub async fn set_email_verified(&self, user_id: Uuid) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET email_verified = TRUE WHERE id = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound);
        }
        Ok(())
    }

    /// Replace the stored password hash.
    pub async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Issue a single-use password reset token, replacing previous ones.
    pub async fn create_reset_token(&self, user_id: Uuid) -> Result<String> {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM reset_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO reset_tokens (token, user_id, expires_at)
                VALUES ($1, $2, NOW() + make_interval(mins => $3))",
        )
        .bind(&token)
        .bind(user_id)
        .bind(RESET_TOKEN_VALIDITY_MIN as i32)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(token)
    }

    /// Redeem a reset token, deleting every token of its owner.
    ///
    /// Returns the owning user, or `None` for unknown/expired tokens.
    pub async fn consume_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<Uuid>> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM reset_tokens
                WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(user_id) = user_id {
            sqlx::query("DELETE FROM reset_tokens WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(user_id)
    }

    /// Insert a bootstrap admin account unless its email already exists.
    pub async fn ensure_admin(
        &self,
        display_name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"INSERT INTO users
                (id, display_name, email, password_hash, role, status,
                 email_verified)
                VALUES ($1, $2, $3, $4, $5, 'APPROVED', TRUE)
                ON CONFLICT (email) DO NOTHING"#,
        )
        .bind(Uuid::new_v4())
        .bind(display_name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            tracing::info!(%email, %role, "bootstrap admin created");
        }
        Ok(())
    }
}
