use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{CommentModel, UserRole};
use crate::response::ApiResponse;
use crate::services::comment::CommentService;
use crate::services::complaint::ComplaintService;
use crate::services::user::UserService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 5000, message = "Comment text is required"))]
    pub content: String,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub complaint_id: i32,
    pub content: String,
    pub author_role: UserRole,
    /// Company answers stay on top
    pub pinned: bool,
    pub anonymous: bool,
    /// Hidden on anonymous comments
    pub author_name: Option<String>,
    pub created_at: String,
}

impl CommentResponse {
    pub fn new(c: CommentModel, names: &HashMap<i32, String>) -> Self {
        let author_name = if c.anonymous {
            None
        } else {
            names.get(&c.user_id).cloned()
        };
        Self {
            id: c.id,
            complaint_id: c.complaint_id,
            content: c.content,
            author_role: c.author_role,
            pinned: c.pinned,
            anonymous: c.anonymous,
            author_name,
            created_at: c.created_at.to_string(),
        }
    }
}

pub(crate) async fn comment_responses(
    db: &DatabaseConnection,
    comments: Vec<CommentModel>,
) -> AppResult<Vec<CommentResponse>> {
    let names = UserService::new(db.clone())
        .names_by_id(comments.iter().map(|c| c.user_id))
        .await?;
    Ok(comments
        .into_iter()
        .map(|c| CommentResponse::new(c, &names))
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/complaints/{id}/comments",
    params(("id" = i32, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Comments, pinned first", body = Vec<CommentResponse>),
        (status = 404, description = "Complaint not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    ComplaintService::new(db.clone()).get_by_id(id).await?;

    let comments = CommentService::new(db.clone()).list_by_complaint(id).await?;
    Ok(ApiResponse::ok(comment_responses(&db, comments).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/complaints/{id}/comments",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Complaint ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Company commenting on another company's complaint", body = AppError),
        (status = 404, description = "Complaint not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = CommentService::new(db.clone());
    let comment = service
        .create(&auth_user, id, &payload.content, payload.anonymous)
        .await?;

    let names = HashMap::from([(auth_user.user_id, auth_user.name.clone())]);
    Ok(ApiResponse::ok(CommentResponse::new(comment, &names)))
}
