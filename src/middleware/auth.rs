use crate::{
    error::{AppError, AppResult},
    models::{User, UserModel, UserRole},
    utils::{
        cookie::{extract_cookie, SESSION_COOKIE},
        decode_session_token,
    },
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::convert::Infallible;

/// The caller of the current request. Built per request from the session
/// token; handlers and services receive it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub name: String,
    pub role: UserRole,
    pub area: Option<String>,
}

impl From<&UserModel> for AuthUser {
    fn from(user: &UserModel) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            role: user.role,
            area: user.area.clone(),
        }
    }
}

/// Session middleware for protected routes: rejects requests without a
/// valid session with 401.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(&headers).ok_or(AppError::Unauthorized)?;
    let auth_user = resolve_session(&db, &token).await?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Session middleware for public views: attaches the caller when the session
/// is valid and lets the request through either way.
pub async fn optional_auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        match resolve_session(&db, &token).await {
            Ok(auth_user) => {
                request.extensions_mut().insert(auth_user);
            }
            Err(e) => tracing::debug!("ignoring invalid session on public route: {}", e),
        }
    }

    next.run(request).await
}

async fn resolve_session(db: &DatabaseConnection, token: &str) -> AppResult<AuthUser> {
    let claims = decode_session_token(token).map_err(|_| AppError::Unauthorized)?;
    let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;

    // Accounts deleted after the token was issued lose their session.
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthUser::from(&user))
}

/// Prefer `Authorization: Bearer`, fall back to the HttpOnly session cookie.
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers).or_else(|| extract_cookie(headers, SESSION_COOKIE))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}
