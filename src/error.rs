//! Error handler for studentport.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::portfolio::ReviewState;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("error reading multipart form data")]
    Multipart(#[from] MultipartError),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("missing or invalid credential")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("no matching record")]
    NotFound,

    #[error("cannot {action} a portfolio in state {state}")]
    InvalidTransition {
        state: ReviewState,
        action: &'static str,
    },

    #[error("visibility can be changed only while the portfolio is approved")]
    NotApproved,

    #[error("{0}")]
    Conflict(&'static str),

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServerError {
    /// Wrap any error as an [`ServerError::Internal`] with context.
    pub fn internal<E>(details: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            details: details.into(),
            source: Some(Box::new(err)),
        }
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Set the stable, machine-readable error kind.
    pub fn kind(mut self, kind: &str) -> Self {
        self.r#type = Some(kind.into());
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: Some("internal".to_owned()),
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => response
                .kind("validation_error")
                .title("There were validation errors with your request.")
                .errors(validation_errors),

            ServerError::Axum(_) | ServerError::Multipart(_) => response
                .kind("validation_error")
                .title("Request body could not be parsed."),

            ServerError::Unauthorized => response
                .kind("unauthorized")
                .title("Missing or invalid 'Authorization' header.")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::Forbidden(_) => response
                .kind("forbidden")
                .title("You are not allowed to perform this action.")
                .status(StatusCode::FORBIDDEN),

            ServerError::NotFound | ServerError::Sql(SQLxError::RowNotFound) => {
                response
                    .kind("not_found")
                    .title("Resource not found.")
                    .details("No matching record.")
                    .status(StatusCode::NOT_FOUND)
            },

            ServerError::InvalidTransition { .. } => response
                .kind("invalid_transition")
                .title("Action not legal for the current review state.")
                .status(StatusCode::CONFLICT),

            ServerError::NotApproved => response
                .kind("not_approved")
                .title("Portfolio is not approved."),

            ServerError::Conflict(_) => response
                .kind("conflict")
                .title("The record changed concurrently.")
                .status(StatusCode::CONFLICT),

            ServerError::Sql(err) => {
                tracing::error!(error = %err, "sql request failed");

                ResponseError::default()
            },

            ServerError::Internal { details, source } => {
                tracing::error!(err = ?source, %details, "server returned 500 status");

                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": "internal",
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
