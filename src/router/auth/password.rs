//! Password change and reset flows.

use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Valid;
use crate::user::{AccountStatus, User, UserRepository};

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeBody {
    pub old_password: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub new_password: String,
}

/// Handler to change the password of a logged-in user.
pub async fn change_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<ChangeBody>,
) -> Result<StatusCode> {
    if !state
        .crypto
        .verify_password(&body.old_password, &user.password_hash)?
    {
        return Err(ServerError::Unauthorized);
    }

    let password_hash = state.crypto.hash_password(&body.new_password)?;
    UserRepository::new(state.db.postgres.clone())
        .update_password(user.id, &password_hash)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotBody {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
}

/// Handler to request a password reset token.
///
/// Always answers success so account emails cannot be enumerated.
/// Token delivery (mail) is outside this service; the token is only
/// traced for operators.
pub async fn forgot_handler(
    State(state): State<AppState>,
    Valid(body): Valid<ForgotBody>,
) -> Result<StatusCode> {
    let repo = UserRepository::new(state.db.postgres.clone());

    if let Some(user) = repo.find_by_email(&body.email).await? {
        if user.status == AccountStatus::Approved {
            let token = repo.create_reset_token(user.id).await?;
            tracing::debug!(user_id = %user.id, %token, "reset token issued");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetBody {
    #[validate(length(equal = 64, message = "Malformed reset token."))]
    pub token: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub new_password: String,
}

fn invalid_reset_token() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "token",
        ValidationError::new("token")
            .with_message("Invalid or expired reset token.".into()),
    );
    errors
}

/// Handler to redeem a reset token for a new password.
pub async fn reset_handler(
    State(state): State<AppState>,
    Valid(body): Valid<ResetBody>,
) -> Result<StatusCode> {
    let repo = UserRepository::new(state.db.postgres.clone());

    let Some(user_id) = repo.consume_reset_token(&body.token).await? else {
        return Err(invalid_reset_token().into());
    };

    let password_hash = state.crypto.hash_password(&body.new_password)?;
    repo.update_password(user_id, &password_hash).await?;

    tracing::info!(%user_id, "password reset completed");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::*;

    #[tokio::test]
    async fn test_change_password_requires_auth() {
        let state = test_state().await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/auth/change-password",
            json!({"old_password": "a", "new_password": "P$soW%920$n&"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_validates_token_shape() {
        let state = test_state().await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/auth/reset-password",
            json!({"token": "short", "new_password": "P$soW%920$n&"})
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
