use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::UserId,
};

/// Maps an opaque access token to the user it was issued to.
///
/// Tokens are issued by the authentication service; this crate only reads them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> AppResult<Option<UserId>>;
}

/// Resolves tokens from the authentication service's `auth_tokens` table
#[derive(Clone)]
pub struct PgTokenResolver {
    pool: PgPool,
}

impl PgTokenResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for PgTokenResolver {
    async fn resolve(&self, token: &str) -> AppResult<Option<UserId>> {
        let user_id =
            sqlx::query_scalar::<_, UserId>("SELECT user_id FROM auth_tokens WHERE key = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user_id)
    }
}

/// The authenticated caller, extracted from the `Authorization` header.
///
/// Accepts `Token <key>` and `Bearer <key>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

/// Pulls the token out of an `Authorization` header value
pub fn access_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<dyn IdentityResolver>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = access_token(&parts.headers).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided".to_string())
        })?;

        let resolver = Arc::<dyn IdentityResolver>::from_ref(state);
        let user_id = resolver
            .resolve(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(AuthUser(user_id))
    }
}
