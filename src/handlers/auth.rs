use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{UserModel, UserRole};
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, NewAccount};
use crate::utils::cookie::{build_clear_cookie, build_session_cookie};
use crate::utils::jwt::session_expiry_seconds;
use anyhow::anyhow;
use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name; company accounts use the company name
    #[validate(length(min = 2, max = 100, message = "Name is too short"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, max = 50, message = "Login is required"))]
    pub login: String,
    /// Password (min 4 characters)
    #[validate(length(min = 4, message = "Password is too short"))]
    pub password: String,
    /// Work area, one of the standard areas or free text
    pub area: Option<String>,
    /// comum (default), vitima or empresa
    pub role: Option<String>,
}

impl RegisterRequest {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            login: self.login.trim().to_string(),
            password: self.password.trim().to_string(),
            area: self
                .area
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            role: self.role,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub login: String,
    pub area: Option<String>,
    pub role: UserRole,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            login: user.login,
            area: user.area,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Session token, also set as the `session_token` cookie
    pub token: String,
    pub user: UserResponse,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created and logged in", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Email or login already in use", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let payload = payload.trimmed();
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => UserRole::default(),
        Some(raw) => raw.parse::<UserRole>().map_err(AppError::Validation)?,
    };

    let service = AuthService::new(db);
    let (user, token) = service
        .register(NewAccount {
            name: payload.name,
            email: payload.email,
            login: payload.login,
            password: payload.password,
            area: payload.area,
            role,
        })
        .await?;

    session_response(token, user)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing login or password", body = AppError),
        (status = 401, description = "Wrong login or password", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (user, token) = service
        .login(payload.login.trim(), &payload.password)
        .await?;

    session_response(token, user)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Session cookie cleared"),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn logout(auth_user: AuthUser) -> AppResult<impl IntoResponse> {
    tracing::debug!(user_id = auth_user.user_id, "logout");
    let mut response = ApiResponse::with_message((), "Logged out".to_string()).into_response();
    append_cookie(&mut response, &build_clear_cookie())?;
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let user = service.get_user_by_id(auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

fn session_response(token: String, user: UserModel) -> AppResult<Response> {
    let cookie = build_session_cookie(&token, session_expiry_seconds());
    let mut response = ApiResponse::ok(AuthResponse {
        token,
        user: UserResponse::from(user),
    })
    .into_response();
    append_cookie(&mut response, &cookie)?;
    Ok(response)
}

fn append_cookie(response: &mut Response, cookie: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(anyhow!("Invalid cookie header: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            name: "  Ana  ".into(),
            email: " ana@example.com ".into(),
            login: " ana ".into(),
            password: " 1234 ".into(),
            area: Some("   ".into()),
            role: None,
        }
    }

    #[test]
    fn trimmed_request_passes_validation() {
        let req = request().trimmed();
        assert_eq!(req.name, "Ana");
        assert_eq!(req.login, "ana");
        assert_eq!(req.area, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn short_fields_fail_validation() {
        let short_name = RegisterRequest {
            name: " A ".into(),
            ..request()
        }
        .trimmed();
        assert!(short_name.validate().is_err());

        let short_password = RegisterRequest {
            password: "abc".into(),
            ..request()
        }
        .trimmed();
        assert!(short_password.validate().is_err());

        let bad_email = RegisterRequest {
            email: "ana.example.com".into(),
            ..request()
        }
        .trimmed();
        assert!(bad_email.validate().is_err());

        let no_login = RegisterRequest {
            login: "  ".into(),
            ..request()
        }
        .trimmed();
        assert!(no_login.validate().is_err());
    }
}
