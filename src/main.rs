use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use denuncia::{config, migration, routes, utils, SupportLocks};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        denuncia::handlers::register,
        denuncia::handlers::login,
        denuncia::handlers::get_current_user,
        denuncia::handlers::auth::logout,
        // Complaint routes
        denuncia::handlers::complaint::list_complaints,
        denuncia::handlers::complaint::list_by_city,
        denuncia::handlers::complaint::list_by_area,
        denuncia::handlers::complaint::list_areas,
        denuncia::handlers::complaint::get_ranking,
        denuncia::handlers::complaint::get_complaint,
        denuncia::handlers::complaint::create_complaint,
        denuncia::handlers::complaint::update_complaint,
        denuncia::handlers::complaint::delete_complaint,
        // Support routes
        denuncia::handlers::support::toggle_support,
        // Comment routes
        denuncia::handlers::comment::list_comments,
        denuncia::handlers::comment::create_comment,
        // Profile routes
        denuncia::handlers::profile::get_profile,
        denuncia::handlers::profile::my_complaints,
    ),
    components(
        schemas(
            denuncia::response::ApiResponse<serde_json::Value>,
            denuncia::error::AppError,
            denuncia::models::UserRole,
            // Auth
            denuncia::handlers::auth::RegisterRequest,
            denuncia::handlers::auth::LoginRequest,
            denuncia::handlers::auth::AuthResponse,
            denuncia::handlers::auth::UserResponse,
            // Complaint
            denuncia::handlers::complaint::ComplaintRequest,
            denuncia::handlers::complaint::ComplaintResponse,
            denuncia::handlers::complaint::FeedResponse,
            denuncia::handlers::complaint::ComplaintDetailResponse,
            denuncia::services::ranking::CompanyRank,
            denuncia::services::ranking::TypeCounts,
            // Support
            denuncia::services::support::SupportToggle,
            // Comment
            denuncia::handlers::comment::CommentResponse,
            denuncia::handlers::comment::CreateCommentRequest,
            // Profile
            denuncia::handlers::profile::ProfileResponse,
        )
    ),
    tags(
        (name = "auth", description = "Account and session operations"),
        (name = "complaints", description = "Complaint feeds, detail and editing"),
        (name = "supports", description = "Support toggling"),
        (name = "comments", description = "Complaint comments"),
        (name = "profile", description = "Caller's profile and complaints"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "denuncia=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;

    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting complaint API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(SupportLocks::new()));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<config::jwt::JwtConfig> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    if env::var("DATABASE_URL").is_err() {
        tracing::warn!(
            "DATABASE_URL not set, using {}",
            config::database::DEFAULT_DATABASE_URL
        );
    }

    let auth_config = config::auth::AuthConfig::from_env();
    tracing::debug!(bcrypt_cost = auth_config.bcrypt_cost, "auth configured");

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Complaint API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
