use auth::Authenticator;
use auth::JwtError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;

use crate::domain::account::models::AccountId;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Identity resolved from a verified token, valid for one request.
///
/// Protected handlers take this as an argument; extraction fails with 401
/// when the request did not pass through [`authenticate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
}

/// Outcome of a rejected request at the gate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Missing token")]
    MissingCredential,

    #[error("Invalid token")]
    InvalidCredential,
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Middleware that validates access tokens and attaches the caller's identity
pub async fn authenticate<AS: AccountServicePort>(
    State(state): State<AppState<AS>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = resolve_identity(&state.authenticator, req.headers())?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

/// Run the gate over request headers: `NoToken -> TokenPresent -> {Valid, Invalid}`.
pub fn resolve_identity(
    authenticator: &Authenticator,
    headers: &HeaderMap,
) -> Result<AuthenticatedAccount, GateError> {
    let token = extract_token_from_header(headers)?;

    let account_id = authenticator.validate_token(token).map_err(|e| match e {
        JwtError::MissingToken => GateError::MissingCredential,
        JwtError::InvalidToken(reason) | JwtError::EncodingFailed(reason) => {
            tracing::warn!(reason = %reason, "Token validation failed");
            GateError::InvalidCredential
        }
    })?;

    Ok(AuthenticatedAccount {
        account_id: AccountId(account_id),
    })
}

/// Read the token from `Authorization`, with or without a `Bearer ` prefix.
fn extract_token_from_header(headers: &HeaderMap) -> Result<&str, GateError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(GateError::MissingCredential)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| GateError::InvalidCredential)?
        .trim();

    let token = auth_str
        .strip_prefix("Bearer ")
        .or_else(|| auth_str.strip_prefix("bearer "))
        .unwrap_or(auth_str)
        .trim();

    if token.is_empty() {
        return Err(GateError::MissingCredential);
    }

    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAccount>()
            .copied()
            .ok_or_else(|| ApiError::from(GateError::MissingCredential))
    }
}
