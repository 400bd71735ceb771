use crate::config::rate_limit::{RateLimitConfig, RateLimitRule, RouteGroup};
use crate::handlers;
use crate::middleware::auth::{auth_middleware, optional_auth_middleware};
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    create_routes_with(&RateLimitConfig::from_env())
}

pub fn create_routes_with(rate_limit_config: &RateLimitConfig) -> Router {
    Router::new().nest("/api/v1", api_routes(rate_limit_config))
}

fn api_routes(config: &RateLimitConfig) -> Router {
    let auth = auth_routes(config);
    let public_read =
        public_read_routes(config).layer(middleware::from_fn(optional_auth_middleware));
    let protected = protected_routes(config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Auth routes: register, login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config.enabled, config.rule(RouteGroup::Auth))
}

/// Public views. A valid session is attached when present.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Feeds
        .route(
            "/complaints",
            routing::get(handlers::complaint::list_complaints),
        )
        .route(
            "/complaints/city",
            routing::get(handlers::complaint::list_by_city),
        )
        .route("/areas", routing::get(handlers::complaint::list_areas))
        .route(
            "/areas/{area}/complaints",
            routing::get(handlers::complaint::list_by_area),
        )
        .route("/ranking", routing::get(handlers::complaint::get_ranking))
        // Detail
        .route(
            "/complaints/{id}",
            routing::get(handlers::complaint::get_complaint),
        )
        .route(
            "/complaints/{id}/comments",
            routing::get(handlers::comment::list_comments),
        );

    with_optional_rate_limit(router, config.enabled, config.rule(RouteGroup::PublicRead))
}

/// Protected routes: everything that needs a session.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        .route("/auth/logout", routing::post(handlers::auth::logout))
        // Complaints
        .route(
            "/complaints",
            routing::post(handlers::complaint::create_complaint),
        )
        .route(
            "/complaints/{id}",
            routing::put(handlers::complaint::update_complaint)
                .delete(handlers::complaint::delete_complaint),
        )
        // Supports
        .route(
            "/complaints/{id}/support",
            routing::post(handlers::support::toggle_support),
        )
        // Comments
        .route(
            "/complaints/{id}/comments",
            routing::post(handlers::comment::create_comment),
        )
        // Profile
        .route("/me/profile", routing::get(handlers::profile::get_profile))
        .route(
            "/me/complaints",
            routing::get(handlers::profile::my_complaints),
        );

    with_optional_rate_limit(router, config.enabled, config.rule(RouteGroup::Protected))
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
