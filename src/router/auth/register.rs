//! Self-registration for students and recruiters.
//!
//! Multipart form: account fields plus the mandatory `id_card` upload.
//! Accounts start `PENDING` and unverified; a super admin reviews them
//! before they can authenticate.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::Result;
use crate::router::parse_enum;
use crate::user::{AccountStatus, Role, User, UserRepository};
use crate::AppState;

#[derive(Debug, Default, Validate)]
struct Form {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Display name must be 1 to 100 characters long."
    ))]
    display_name: String,
    #[validate(email(message = "Email must be formatted."))]
    email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    password: String,
    university: Option<String>,
    organization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub id_card_url: String,
}

fn invalid(field: &'static str, message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new(field).with_message(message.into()),
    );
    errors
}

/// Handler to register an account.
pub async fn handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Response>)> {
    let mut form = Form::default();
    let mut role_raw = String::new();
    let mut id_card: Option<(Option<String>, Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "display_name" => form.display_name = field.text().await?,
            "email" => form.email = field.text().await?,
            "password" => form.password = field.text().await?,
            "role" => role_raw = field.text().await?,
            "university" => form.university = Some(field.text().await?),
            "organization" => form.organization = Some(field.text().await?),
            "id_card" => {
                let filename = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                id_card = Some((filename, content_type, field.bytes().await?));
            },
            _ => {},
        }
    }

    form.validate()?;

    let Some(role) = parse_enum::<Role>(&role_raw) else {
        return Err(invalid("role", "Unknown role.").into());
    };
    if !role.self_registrable() {
        return Err(
            invalid("role", "Invalid role for self-registration.").into()
        );
    }

    if role == Role::Student {
        if let Some(domain) = &state.config.student_email_domain {
            if !form.email.ends_with(&format!("@{domain}")) {
                return Err(invalid(
                    "email",
                    "Students must register with their university email.",
                )
                .into());
            }
        }
    }

    let Some((filename, content_type, bytes)) = id_card else {
        return Err(invalid("id_card", "Please upload an ID card file.").into());
    };
    let id_card_url = state
        .id_cards
        .store(filename.as_deref(), content_type.as_deref(), &bytes)
        .await?;

    let user = User {
        id: Uuid::new_v4(),
        display_name: form.display_name,
        email: form.email,
        password_hash: state.crypto.hash_password(&form.password)?,
        role,
        status: AccountStatus::Pending,
        email_verified: false,
        university: form.university,
        organization: form.organization,
        id_card_url: Some(id_card_url.clone()),
        created_at: chrono::Utc::now(),
    };

    UserRepository::new(state.db.postgres.clone()).insert(&user).await?;

    tracing::info!(user_id = %user.id, %role, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(Response {
            id: user.id,
            email: user.email,
            role: user.role,
            status: user.status,
            id_card_url,
        }),
    ))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{header, Method, StatusCode};
    use tower::util::ServiceExt;

    use crate::*;

    const BOUNDARY: &str = "----studentport-test-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn multipart_request(parts: &[(&str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, value) in parts {
            body.push_str(&text_part(name, value));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method(Method::POST)
            .uri("/auth/register")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_refuses_admin_roles() {
        let app = app(test_state().await);

        let request = multipart_request(&[
            ("display_name", "Sneaky"),
            ("email", "sneaky@example.com"),
            ("password", "P$soW%920$n&"),
            ("role", "SUPER_ADMIN"),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_requires_id_card() {
        let app = app(test_state().await);

        let request = multipart_request(&[
            ("display_name", "Student"),
            ("email", "student@example.com"),
            ("password", "P$soW%920$n&"),
            ("role", "STUDENT"),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_validates_fields() {
        let app = app(test_state().await);

        let request = multipart_request(&[
            ("display_name", "Student"),
            ("email", "not-an-email"),
            ("password", "short"),
            ("role", "STUDENT"),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
