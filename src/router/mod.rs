//! HTTP routes.

pub mod admin;
pub mod auth;
pub mod portfolios;
pub mod status;

use axum::Json;
use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{Result, ServerError};
use crate::user::{AccountStatus, Caller, Role, UserRepository};
use crate::AppState;

const BEARER: &str = "Bearer ";

/// Json extractor which also runs `validator` checks.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Caller, when a valid token accompanied the request.
#[derive(Clone, Copy, Debug)]
pub struct MaybeCaller(pub Option<Caller>);

fn bearer_caller(state: &AppState, req: &Request) -> Result<Caller> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ServerError::Unauthorized)?;
    let token = token.strip_prefix(BEARER).unwrap_or(token);

    state.token.decode(token)
}

/// Custom middleware for authentification.
///
/// The account behind the token must still exist and be approved (and
/// verified, when the deployment requires it).
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let caller = bearer_caller(&state, &req)?;

    let user = match UserRepository::new(state.db.postgres.clone())
        .find_by_id(caller.id)
        .await
    {
        Ok(user) => user,
        // A token whose account vanished is just an invalid credential.
        Err(ServerError::NotFound) => return Err(ServerError::Unauthorized),
        Err(err) => return Err(err),
    };

    if user.status != AccountStatus::Approved {
        return Err(ServerError::Forbidden("account is not approved yet"));
    }
    if state.config.require_email_verification && !user.email_verified {
        return Err(ServerError::Forbidden("email is not verified yet"));
    }

    // The stored role wins over a stale token claim.
    req.extensions_mut().insert(Caller {
        id: user.id,
        role: user.role,
    });
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Middleware for routes guests may reach: resolve the caller when a
/// valid token is present, treat the request as anonymous otherwise.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let caller = bearer_caller(&state, &req).ok();

    req.extensions_mut().insert(MaybeCaller(caller));
    next.run(req).await
}

/// Check the caller holds one of the `allowed` roles.
pub fn require_role(caller: &Caller, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&caller.role) {
        Ok(())
    } else {
        Err(ServerError::Forbidden("role not allowed"))
    }
}

/// Parse a closed enumeration from its serialized form, e.g. a
/// multipart text field carrying `"STUDENT"` or `"AI"`.
pub(crate) fn parse_enum<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.to_owned())).ok()
}
