use crate::error::AppResult;
use crate::handlers::auth::UserResponse;
use crate::handlers::complaint::{complaint_responses, ComplaintResponse};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::services::complaint::ComplaintService;
use crate::services::ranking::TypeCounts;
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    /// Complaints against the company for company accounts, own complaints otherwise
    pub complaints: Vec<ComplaintResponse>,
    pub counts: TypeCounts,
}

#[utoipa::path(
    get,
    path = "/api/v1/me/profile",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Profile with its complaint listing", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "profile"
)]
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user = AuthService::new(db.clone())
        .get_user_by_id(auth_user.user_id)
        .await?;

    let service = ComplaintService::new(db.clone());
    let complaints = if auth_user.role.is_company() {
        service.list_by_company(&auth_user.name).await?
    } else {
        service.list_by_owner(auth_user.user_id).await?
    };
    let counts = TypeCounts::from_complaints(&complaints);

    Ok(ApiResponse::ok(ProfileResponse {
        user: user.into(),
        complaints: complaint_responses(&db, complaints).await?,
        counts,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/complaints",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Complaints filed by the caller", body = Vec<ComplaintResponse>),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "profile"
)]
pub async fn my_complaints(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let complaints = ComplaintService::new(db.clone())
        .list_by_owner(auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(complaint_responses(&db, complaints).await?))
}
