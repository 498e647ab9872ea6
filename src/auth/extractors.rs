use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::Claims, jwt::TokenKeys};
use crate::errors::AppError;

/// Reads `Authorization: Bearer <token>` and verifies it against `keys`.
pub fn verify_headers(headers: &HeaderMap, keys: &TokenKeys) -> Result<Claims, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::AuthHeaderMissing)?;
    let header = header.to_str().map_err(|_| AppError::InvalidToken)?;

    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().map(str::trim).unwrap_or_default();
    if token.is_empty() {
        return Err(AppError::TokenMissing);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        warn!(scheme, "unsupported auth scheme");
        return Err(AppError::InvalidToken);
    }

    keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::InvalidToken
    })
}

/// Route layer for protected routers: rejects unauthenticated requests and stores the
/// decoded [`Claims`] in the request extensions for downstream handlers.
pub async fn require_auth(
    State(keys): State<TokenKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_headers(req.headers(), &keys)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Authenticated caller. Taken from the extensions when [`require_auth`] already ran,
/// otherwise verified from the headers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.user_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(AuthUser(claims.clone()));
        }
        let keys = TokenKeys::from_ref(state);
        verify_headers(&parts.headers, &keys).map(AuthUser)
    }
}
