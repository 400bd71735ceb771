use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::support::{SupportLocks, SupportService, SupportToggle};
use axum::{extract::Path, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;

#[utoipa::path(
    post,
    path = "/api/v1/complaints/{id}/support",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Support toggled; applied is false for company accounts", body = SupportToggle),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 404, description = "Complaint not found", body = crate::error::AppError),
    ),
    tag = "supports"
)]
pub async fn toggle_support(
    Extension(db): Extension<DatabaseConnection>,
    Extension(locks): Extension<SupportLocks>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = SupportService::new(db, locks);
    let result = service.toggle(&auth_user, id).await?;

    let message = match (result.applied, result.supported) {
        (false, _) => "Company accounts cannot support complaints",
        (true, true) => "Support added",
        (true, false) => "Support removed",
    };
    Ok(ApiResponse::with_message(result, message.to_string()))
}
