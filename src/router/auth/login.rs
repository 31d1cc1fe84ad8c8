//! Login with email and password.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Valid;
use crate::user::{AccountStatus, Role, UserRepository};

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
    pub role: Role,
    pub display_name: String,
}

/// Handler to log a user in.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = UserRepository::new(state.db.postgres.clone())
        .find_by_email(&body.email)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    if !state.crypto.verify_password(&body.password, &user.password_hash)? {
        return Err(ServerError::Unauthorized);
    }

    if user.status != AccountStatus::Approved {
        return Err(ServerError::Forbidden("account is not approved yet"));
    }
    if state.config.require_email_verification && !user.email_verified {
        return Err(ServerError::Forbidden("email is not verified yet"));
    }

    let token = state.token.create(user.id, user.role)?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        token,
        expires_in: crate::token::EXPIRATION_TIME,
        role: user.role,
        display_name: user.display_name,
    }))
}

/// Tokens are stateless, logout is client-side only.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::*;

    #[tokio::test]
    async fn test_login_validates_email_shape() {
        let state = test_state().await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/auth/login",
            json!({"email": "nope", "password": "P$soW%920$n&"}).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_refuses_empty_body() {
        let state = test_state().await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/auth/login",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_is_stateless() {
        let state = test_state().await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/auth/logout",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
