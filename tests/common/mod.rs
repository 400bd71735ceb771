#![allow(dead_code)]

use reqwest::Client;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use tempfile::TempDir;

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("BCRYPT_COST", "4");
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = denuncia::config::jwt::JwtConfig::from_env().unwrap();
        let _ = denuncia::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    // Keeps a file-backed store alive for the lifetime of the app.
    _dir: Option<TempDir>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

/// Each app gets its own in-memory store, so tests never see each other's data.
pub async fn spawn_app() -> TestApp {
    init_env();

    let db = denuncia::config::database::connect("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory database");

    serve(db, None).await
}

/// Like `spawn_app`, but backed by a SQLite file in a temp dir and a pool with
/// several connections, so concurrent requests really run side by side.
pub async fn spawn_file_app() -> TestApp {
    init_env();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("denuncias.db").display()
    );
    let db = denuncia::config::database::connect(&url, 4, 1)
        .await
        .expect("Failed to open file database");

    serve(db, Some(dir)).await
}

async fn serve(db: DatabaseConnection, dir: Option<TempDir>) -> TestApp {
    denuncia::migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(denuncia::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(denuncia::SupportLocks::new()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
        _dir: dir,
    }
}

/// Register an account and return (user_id, token). `name` is used verbatim
/// so company accounts can be matched against complaint targets.
pub async fn create_user(
    app: &TestApp,
    name: &str,
    role: &str,
    area: Option<&str>,
) -> (i32, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let login = format!("user_{}", counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": name,
            "email": format!("{}@test.com", login),
            "login": login,
            "password": "secret_123",
            "area": area,
            "role": role,
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to register '{}': status={}, body={}", name, status, body);
    }

    let user_id = body["data"]["user"]["id"].as_i64().unwrap() as i32;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// File a complaint and return its id.
pub async fn create_complaint(app: &TestApp, token: &str, fields: Value) -> i64 {
    let mut payload = serde_json::json!({
        "title": "Assédio no trabalho",
        "description": "Descrição do ocorrido",
        "type": "moral",
    });
    if let (Some(base), Some(extra)) = (payload.as_object_mut(), fields.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }

    let resp = app
        .client
        .post(app.url("/complaints"))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to create complaint");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(status, 200, "create complaint failed: {}", body);
    body["data"]["id"].as_i64().unwrap()
}

pub async fn get_json(app: &TestApp, path: &str, token: Option<&str>) -> (u16, Value) {
    let mut req = app.client.get(app.url(path));
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let resp = req.send().await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

pub async fn toggle_support(app: &TestApp, token: &str, complaint_id: i64) -> (u16, Value) {
    let resp = app
        .client
        .post(app.url(&format!("/complaints/{}/support", complaint_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}
