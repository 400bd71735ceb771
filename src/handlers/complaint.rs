use crate::error::{AppError, AppResult};
use crate::handlers::comment::CommentResponse;
use crate::middleware::AuthUser;
use crate::models::{ComplaintModel, STANDARD_AREAS};
use crate::response::ApiResponse;
use crate::services::comment::CommentService;
use crate::services::complaint::{ComplaintInput, ComplaintService};
use crate::services::ranking::{rank_companies, CompanyRank, TypeCounts};
use crate::services::support::{SupportLocks, SupportService};
use crate::services::user::UserService;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ComplaintRequest {
    #[validate(length(max = 200))]
    pub title: String,
    pub description: String,
    /// moral, sexual, salarial or free text
    #[serde(rename = "type", default)]
    #[validate(length(max = 50))]
    pub kind: String,
    /// Target company; "Não informada" when omitted
    #[validate(length(max = 200))]
    pub company: Option<String>,
    /// Defaults to the author's area
    pub work_area: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

impl From<ComplaintRequest> for ComplaintInput {
    fn from(req: ComplaintRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            kind: req.kind,
            company: req.company,
            work_area: req.work_area,
            city: req.city,
            anonymous: req.anonymous,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplaintResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub company: String,
    pub work_area: Option<String>,
    pub city: String,
    pub user_area: Option<String>,
    pub anonymous: bool,
    pub supports: i32,
    /// Hidden on anonymous complaints
    pub author_id: Option<i32>,
    /// Hidden on anonymous complaints
    pub author_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ComplaintResponse {
    pub fn new(c: ComplaintModel, names: &HashMap<i32, String>) -> Self {
        let (author_id, author_name) = if c.anonymous {
            (None, None)
        } else {
            (Some(c.user_id), names.get(&c.user_id).cloned())
        };
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            kind: c.kind,
            company: c.company,
            work_area: c.work_area,
            city: c.city,
            user_area: c.user_area,
            anonymous: c.anonymous,
            supports: c.supports,
            author_id,
            author_name,
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
        }
    }
}

/// Everything a complaint listing page shows.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedResponse {
    pub complaints: Vec<ComplaintResponse>,
    /// Counters over `complaints` only
    pub counts: TypeCounts,
    /// Ranking over every stored complaint
    pub ranking: Vec<CompanyRank>,
    pub areas: Vec<String>,
    pub filter_area: Option<String>,
    pub filter_city: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplaintDetailResponse {
    pub complaint: ComplaintResponse,
    /// Pinned first
    pub comments: Vec<CommentResponse>,
    /// Whether the viewer currently supports this complaint
    pub supported: bool,
    /// Whether the viewer is the company this complaint targets
    pub is_target_company: bool,
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

pub(crate) async fn complaint_responses(
    db: &DatabaseConnection,
    complaints: Vec<ComplaintModel>,
) -> AppResult<Vec<ComplaintResponse>> {
    let names = UserService::new(db.clone())
        .names_by_id(complaints.iter().map(|c| c.user_id))
        .await?;
    Ok(complaints
        .into_iter()
        .map(|c| ComplaintResponse::new(c, &names))
        .collect())
}

/// `complaints` is the already filtered listing; the ranking always covers
/// the whole store.
async fn build_feed(
    db: &DatabaseConnection,
    complaints: Vec<ComplaintModel>,
    ranking: Vec<CompanyRank>,
    filter_area: Option<String>,
    filter_city: Option<String>,
) -> AppResult<FeedResponse> {
    let counts = TypeCounts::from_complaints(&complaints);
    let complaints = complaint_responses(db, complaints).await?;

    Ok(FeedResponse {
        complaints,
        counts,
        ranking,
        areas: STANDARD_AREAS.iter().map(|a| a.to_string()).collect(),
        filter_area,
        filter_city,
    })
}

async fn overall_ranking(db: &DatabaseConnection) -> AppResult<Vec<CompanyRank>> {
    let all = ComplaintService::new(db.clone()).list_all().await?;
    Ok(rank_companies(&all))
}

async fn unfiltered_feed(db: &DatabaseConnection) -> AppResult<FeedResponse> {
    let all = ComplaintService::new(db.clone()).list_all().await?;
    let ranking = rank_companies(&all);
    build_feed(db, all, ranking, None, None).await
}

#[utoipa::path(
    get,
    path = "/api/v1/complaints",
    responses(
        (status = 200, description = "All complaints with counters and ranking", body = FeedResponse),
    ),
    tag = "complaints"
)]
pub async fn list_complaints(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(unfiltered_feed(&db).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/areas/{area}/complaints",
    params(("area" = String, Path, description = "Work area, matched exactly")),
    responses(
        (status = 200, description = "Complaints filed from this work area", body = FeedResponse),
    ),
    tag = "complaints"
)]
pub async fn list_by_area(
    Extension(db): Extension<DatabaseConnection>,
    Path(area): Path<String>,
) -> AppResult<impl IntoResponse> {
    let complaints = ComplaintService::new(db.clone()).list_by_area(&area).await?;
    let ranking = overall_ranking(&db).await?;
    let feed = build_feed(&db, complaints, ranking, Some(area), None).await?;
    Ok(ApiResponse::ok(feed))
}

#[utoipa::path(
    get,
    path = "/api/v1/complaints/city",
    params(("city" = Option<String>, Query, description = "City, any casing")),
    responses(
        (status = 200, description = "Complaints in the city; all complaints when empty", body = FeedResponse),
    ),
    tag = "complaints"
)]
pub async fn list_by_city(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<CityQuery>,
) -> AppResult<impl IntoResponse> {
    let city = query
        .city
        .map(|c| crate::utils::normalize_city(&c))
        .filter(|c| !c.is_empty());

    let feed = match city {
        Some(city) => {
            let complaints = ComplaintService::new(db.clone()).list_by_city(&city).await?;
            let ranking = overall_ranking(&db).await?;
            build_feed(&db, complaints, ranking, None, Some(city)).await?
        }
        None => unfiltered_feed(&db).await?,
    };
    Ok(ApiResponse::ok(feed))
}

#[utoipa::path(
    get,
    path = "/api/v1/areas",
    responses(
        (status = 200, description = "Standard work areas", body = Vec<String>),
    ),
    tag = "complaints"
)]
pub async fn list_areas() -> impl IntoResponse {
    ApiResponse::ok(STANDARD_AREAS.to_vec())
}

#[utoipa::path(
    get,
    path = "/api/v1/ranking",
    responses(
        (status = 200, description = "Top companies by number of complaints", body = Vec<CompanyRank>),
    ),
    tag = "complaints"
)]
pub async fn get_ranking(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(overall_ranking(&db).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/complaints/{id}",
    params(("id" = i32, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint with its comments", body = ComplaintDetailResponse),
        (status = 404, description = "Complaint not found", body = AppError),
    ),
    tag = "complaints"
)]
pub async fn get_complaint(
    Extension(db): Extension<DatabaseConnection>,
    Extension(locks): Extension<SupportLocks>,
    viewer: Option<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let complaint = ComplaintService::new(db.clone()).get_by_id(id).await?;

    let (supported, is_target_company) = match &viewer {
        Some(viewer) => {
            let supported = SupportService::new(db.clone(), locks)
                .is_supporting(viewer.user_id, id)
                .await?;
            let is_target = viewer.role.is_company() && viewer.name == complaint.company;
            (supported, is_target)
        }
        None => (false, false),
    };

    let comments = CommentService::new(db.clone())
        .list_by_complaint(id)
        .await?;
    let comments = crate::handlers::comment::comment_responses(&db, comments).await?;
    let complaint = complaint_responses(&db, vec![complaint])
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::ok(ComplaintDetailResponse {
        complaint,
        comments,
        supported,
        is_target_company,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/complaints",
    security(("jwt_token" = [])),
    request_body = ComplaintRequest,
    responses(
        (status = 200, description = "Complaint filed", body = ComplaintResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Company accounts cannot file complaints", body = AppError),
    ),
    tag = "complaints"
)]
pub async fn create_complaint(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ComplaintRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = ComplaintService::new(db.clone());
    let complaint = service.create(&auth_user, payload.into()).await?;
    let mut responses = complaint_responses(&db, vec![complaint]).await?;
    let response = responses.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    put,
    path = "/api/v1/complaints/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Complaint ID")),
    request_body = ComplaintRequest,
    responses(
        (status = 200, description = "Complaint updated", body = ComplaintResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Complaint not found", body = AppError),
    ),
    tag = "complaints"
)]
pub async fn update_complaint(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ComplaintRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = ComplaintService::new(db.clone());
    let complaint = service.update(&auth_user, id, payload.into()).await?;
    let mut responses = complaint_responses(&db, vec![complaint]).await?;
    let response = responses.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    delete,
    path = "/api/v1/complaints/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint, its supports and comments deleted"),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Complaint not found", body = AppError),
    ),
    tag = "complaints"
)]
pub async fn delete_complaint(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ComplaintService::new(db);
    service.delete(&auth_user, id).await?;
    Ok(ApiResponse::with_message((), "Complaint deleted".to_string()))
}
