mod common;

use serde_json::{json, Value};

async fn post_comment(
    app: &common::TestApp,
    token: &str,
    complaint_id: i64,
    payload: Value,
) -> (u16, Value) {
    let resp = app
        .client
        .post(app.url(&format!("/complaints/{}/comments", complaint_id)))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn company_answer_is_pinned_first() {
    let app = common::spawn_app().await;
    let (_, ana) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, bia) = common::create_user(&app, "Bia", "comum", None).await;
    let (_, acme) = common::create_user(&app, "Acme Corp", "empresa", None).await;
    let id = common::create_complaint(&app, &ana, json!({ "company": "Acme Corp" })).await;

    let (status, _) = post_comment(&app, &bia, id, json!({ "content": "Isso é grave" })).await;
    assert_eq!(status, 200);

    let (status, body) =
        post_comment(&app, &acme, id, json!({ "content": "Estamos apurando" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["pinned"], true);
    assert_eq!(body["data"]["author_role"], "empresa");

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(&acme)).await;
    assert_eq!(body["data"]["is_target_company"], true);
    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["content"], "Estamos apurando");
    assert_eq!(comments[0]["pinned"], true);
    assert_eq!(comments[1]["content"], "Isso é grave");
    assert_eq!(comments[1]["pinned"], false);

    let (status, body) = common::get_json(&app, &format!("/complaints/{}/comments", id), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["author_name"], "Acme Corp");
}

#[tokio::test]
async fn other_company_cannot_comment() {
    let app = common::spawn_app().await;
    let (_, ana) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, other) = common::create_user(&app, "OtherCo", "empresa", None).await;
    let id = common::create_complaint(&app, &ana, json!({ "company": "Acme Corp" })).await;

    let (status, _) = post_comment(&app, &other, id, json!({ "content": "Não somos nós" })).await;
    assert_eq!(status, 403);

    let (_, body) = common::get_json(&app, &format!("/complaints/{}/comments", id), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = common::get_json(&app, &format!("/complaints/{}", id), Some(&other)).await;
    assert_eq!(body["data"]["is_target_company"], false);
}

#[tokio::test]
async fn regular_comments_keep_insertion_order() {
    let app = common::spawn_app().await;
    let (_, ana) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, bia) = common::create_user(&app, "Bia", "comum", None).await;
    let id = common::create_complaint(&app, &ana, json!({})).await;

    for text in ["primeiro", "segundo", "terceiro"] {
        let (status, _) = post_comment(&app, &bia, id, json!({ "content": text })).await;
        assert_eq!(status, 200);
    }

    let (_, body) = common::get_json(&app, &format!("/complaints/{}/comments", id), None).await;
    let contents: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, ["primeiro", "segundo", "terceiro"]);
}

#[tokio::test]
async fn anonymous_comment_hides_author() {
    let app = common::spawn_app().await;
    let (_, ana) = common::create_user(&app, "Ana", "vitima", None).await;
    let (_, bia) = common::create_user(&app, "Bia", "comum", None).await;
    let id = common::create_complaint(&app, &ana, json!({})).await;

    let (status, body) = post_comment(
        &app,
        &bia,
        id,
        json!({ "content": "Passei pelo mesmo", "anonymous": true }),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["data"]["author_name"].is_null());

    let (_, body) = common::get_json(&app, &format!("/complaints/{}/comments", id), None).await;
    assert!(body["data"][0]["author_name"].is_null());
    assert_eq!(body["data"][0]["anonymous"], true);
}

#[tokio::test]
async fn empty_or_misplaced_comments_are_rejected() {
    let app = common::spawn_app().await;
    let (_, ana) = common::create_user(&app, "Ana", "vitima", None).await;
    let id = common::create_complaint(&app, &ana, json!({})).await;

    let (status, _) = post_comment(&app, &ana, id, json!({ "content": "   " })).await;
    assert_eq!(status, 400);

    let (status, _) = post_comment(&app, &ana, 999, json!({ "content": "oi" })).await;
    assert_eq!(status, 404);

    let resp = app
        .client
        .post(app.url(&format!("/complaints/{}/comments", id)))
        .json(&json!({ "content": "oi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
