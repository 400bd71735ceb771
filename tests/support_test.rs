mod common;

use denuncia::models::{complaint, support, Complaint, Support};
use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

async fn support_records(app: &common::TestApp, complaint_id: i64) -> u64 {
    Support::find()
        .filter(support::Column::ComplaintId.eq(complaint_id as i32))
        .count(&app.db)
        .await
        .unwrap()
}

/// Overwrite the stored counter without touching the Support rows.
async fn force_counter(app: &common::TestApp, complaint_id: i64, value: i32) {
    Complaint::update_many()
        .col_expr(complaint::Column::Supports, Expr::value(value))
        .filter(complaint::Column::Id.eq(complaint_id as i32))
        .exec(&app.db)
        .await
        .unwrap();
}

async fn toggle_concurrently(app: &common::TestApp, tokens: Vec<String>, complaint_id: i64) {
    let mut set = tokio::task::JoinSet::new();
    for token in tokens {
        let client = app.client.clone();
        let url = app.url(&format!("/complaints/{}/support", complaint_id));
        set.spawn(async move {
            client
                .post(url)
                .bearer_auth(token)
                .send()
                .await
                .unwrap()
                .status()
        });
    }
    while let Some(status) = set.join_next().await {
        assert_eq!(status.unwrap(), 200);
    }
}

#[tokio::test]
async fn toggle_adds_then_removes_support() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, user) = common::create_user(&app, "Bia", "comum", None).await;
    let id = common::create_complaint(&app, &owner, json!({})).await;

    let (status, body) = common::toggle_support(&app, &user, id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["applied"], true);
    assert_eq!(body["data"]["supported"], true);
    assert_eq!(body["data"]["supports"], 1);

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(&user)).await;
    assert_eq!(body["data"]["supported"], true);
    assert_eq!(body["data"]["complaint"]["supports"], 1);

    let (status, body) = common::toggle_support(&app, &user, id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["supported"], false);
    assert_eq!(body["data"]["supports"], 0);

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(&user)).await;
    assert_eq!(body["data"]["supported"], false);
    assert_eq!(body["data"]["complaint"]["supports"], 0);
}

#[tokio::test]
async fn two_users_support_independently() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, u1) = common::create_user(&app, "Bia", "comum", None).await;
    let (_, u2) = common::create_user(&app, "Carla", "vitima", None).await;
    let id = common::create_complaint(&app, &owner, json!({})).await;

    common::toggle_support(&app, &u1, id).await;
    let (_, body) = common::toggle_support(&app, &u2, id).await;
    assert_eq!(body["data"]["supports"], 2);

    let (_, body) = common::toggle_support(&app, &u1, id).await;
    assert_eq!(body["data"]["supports"], 1);

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(&u2)).await;
    assert_eq!(body["data"]["supported"], true);
    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(&u1)).await;
    assert_eq!(body["data"]["supported"], false);
}

#[tokio::test]
async fn owner_may_support_own_complaint() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let id = common::create_complaint(&app, &owner, json!({})).await;

    let (_, body) = common::toggle_support(&app, &owner, id).await;
    assert_eq!(body["data"]["applied"], true);
    assert_eq!(body["data"]["supports"], 1);
}

#[tokio::test]
async fn company_toggle_changes_nothing() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, user) = common::create_user(&app, "Bia", "comum", None).await;
    let (_, acme) = common::create_user(&app, "Acme Corp", "empresa", None).await;
    let id = common::create_complaint(&app, &owner, json!({ "company": "Acme Corp" })).await;
    common::toggle_support(&app, &user, id).await;

    let (status, body) = common::toggle_support(&app, &acme, id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["applied"], false);
    assert_eq!(body["data"]["supported"], false);
    assert_eq!(body["data"]["supports"], 1);

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), None).await;
    assert_eq!(body["data"]["complaint"]["supports"], 1);
}

#[tokio::test]
async fn toggle_on_missing_complaint_is_not_found() {
    let app = common::spawn_app().await;
    let (_, user) = common::create_user(&app, "Bia", "comum", None).await;

    let (status, _) = common::toggle_support(&app, &user, 4242).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn toggle_requires_a_session() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let id = common::create_complaint(&app, &owner, json!({})).await;

    let resp = app
        .client
        .post(app.url(&format!("/complaints/{}/support", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn removal_with_counter_already_at_zero_stays_at_zero() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, user) = common::create_user(&app, "Bia", "comum", None).await;
    let id = common::create_complaint(&app, &owner, json!({})).await;

    let (_, body) = common::toggle_support(&app, &user, id).await;
    assert_eq!(body["data"]["supports"], 1);
    force_counter(&app, id, 0).await;

    let (status, body) = common::toggle_support(&app, &user, id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["applied"], true);
    assert_eq!(body["data"]["supported"], false);
    assert_eq!(body["data"]["supports"], 0);
    assert_eq!(support_records(&app, id).await, 0);

    // The next toggle adds again from the floor.
    let (_, body) = common::toggle_support(&app, &user, id).await;
    assert_eq!(body["data"]["supported"], true);
    assert_eq!(body["data"]["supports"], 1);
}

#[tokio::test]
async fn removal_with_counter_above_records_decrements_once() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, user) = common::create_user(&app, "Bia", "comum", None).await;
    let id = common::create_complaint(&app, &owner, json!({})).await;

    common::toggle_support(&app, &user, id).await;
    force_counter(&app, id, 5).await;

    let (status, body) = common::toggle_support(&app, &user, id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["supported"], false);
    assert_eq!(body["data"]["supports"], 4);
    assert_eq!(support_records(&app, id).await, 0);

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(&user)).await;
    assert_eq!(body["data"]["supported"], false);
    assert_eq!(body["data"]["complaint"]["supports"], 4);
}

#[tokio::test]
async fn concurrent_toggles_keep_counter_consistent() {
    let app = common::spawn_file_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, user) = common::create_user(&app, "Bia", "comum", None).await;
    let id = common::create_complaint(&app, &owner, json!({})).await;

    // An even number of toggles by one user must end where it started.
    toggle_concurrently(&app, vec![user.clone(); 6], id).await;

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(&user)).await;
    assert_eq!(body["data"]["complaint"]["supports"], 0);
    assert_eq!(body["data"]["supported"], false);
    assert_eq!(support_records(&app, id).await, 0);
}

#[tokio::test]
async fn concurrent_toggles_by_different_users_all_count() {
    let app = common::spawn_file_app().await;
    let (_, owner) = common::create_user(&app, "Ana", "vitima", None).await;
    let id = common::create_complaint(&app, &owner, json!({})).await;

    let mut tokens = Vec::new();
    for i in 0..5 {
        let (_, token) = common::create_user(&app, &format!("Apoiador {}", i), "comum", None).await;
        tokens.push(token);
    }

    toggle_concurrently(&app, tokens.clone(), id).await;

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), None).await;
    assert_eq!(body["data"]["complaint"]["supports"], 5);
    assert_eq!(support_records(&app, id).await, 5);

    for token in &tokens {
        let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(token)).await;
        assert_eq!(body["data"]["supported"], true);
    }
}
