// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{create_test_app, signup, TestApp};
use axum::http::StatusCode;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use uuid::Uuid;
use web3roast::infrastructure::database::entities::{roast, share_link};

async fn anonymous_roast(app: &TestApp, session: &str) -> String {
    let created: Value = app
        .server
        .post("/v1/roasts")
        .add_header("X-Session-Id", session)
        .json(&json!({ "url": "https://example.com" }))
        .await
        .json();
    created["id"].as_str().unwrap().to_string()
}

/// 测试健康检查与版本端点
#[tokio::test]
async fn test_health_and_version_are_public() {
    let app = create_test_app().await;

    let health = app.server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.text(), "OK");

    let version = app.server.get("/v1/version").await;
    version.assert_status_ok();
    assert_eq!(version.text(), env!("CARGO_PKG_VERSION"));
}

/// 为不存在的 roast 创建分享链接返回 404，且不写入分享记录
#[tokio::test]
async fn test_share_for_missing_roast_is_not_found() {
    let app = create_test_app().await;
    let token = signup(&app, "a@b.io").await;

    let response = app
        .server
        .post(&format!("/v1/roasts/{}/share", Uuid::new_v4()))
        .add_header("Authorization", format!("Bearer {}", token))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.json::<Value>()["error"].is_string());
    let links = share_link::Entity::find()
        .count(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(links, 0);
}

#[tokio::test]
async fn test_unknown_share_id_is_not_found() {
    let app = create_test_app().await;
    app.server
        .get("/v1/share/doesnotexist")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// 匿名创建需要会话ID，且每个会话只能试用一次
#[tokio::test]
async fn test_anonymous_creation_rules() {
    let app = create_test_app().await;

    app.server
        .post("/v1/roasts")
        .json(&json!({ "url": "https://example.com" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    anonymous_roast(&app, "trial-session").await;
    let second = app
        .server
        .post("/v1/roasts")
        .add_header("X-Session-Id", "trial-session")
        .json(&json!({ "url": "https://example.org" }))
        .await;
    second.assert_status(StatusCode::FORBIDDEN);

    let rows = roast::Entity::find().count(app.db.as_ref()).await.unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_private_targets_are_rejected() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/roasts")
        .add_header("X-Session-Id", "ssrf-session")
        .json(&json!({ "url": "http://127.0.0.1:8080/admin" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_bearer_token_is_rejected() {
    let app = create_test_app().await;

    app.server
        .get("/v1/me")
        .add_header("Authorization", "Bearer wr_not_a_real_key")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/v1/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

/// 会话ID不匹配的认领返回 403，原记录不变
#[tokio::test]
async fn test_claim_with_wrong_session_is_forbidden() {
    let app = create_test_app().await;
    let id = anonymous_roast(&app, "owner-session").await;
    app.server
        .post("/v1/analyze")
        .json(&json!({ "requestId": id }))
        .await
        .assert_status_ok();
    let token = signup(&app, "thief@b.io").await;

    app.server
        .post("/v1/roasts/claim")
        .add_header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "requestId": id, "sessionId": "other-session" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let rows = roast::Entity::find().count(app.db.as_ref()).await.unwrap();
    assert_eq!(rows, 1);
    let original: Value = app
        .server
        .get(&format!("/v1/roasts/{}", id))
        .add_header("X-Session-Id", "owner-session")
        .await
        .json();
    assert!(original["claimedByUserId"].is_null());
}

#[tokio::test]
async fn test_second_analyze_conflicts() {
    let app = create_test_app().await;
    let id = anonymous_roast(&app, "repeat-session").await;

    app.server
        .post("/v1/analyze")
        .json(&json!({ "requestId": id }))
        .await
        .assert_status_ok();
    let again = app
        .server
        .post("/v1/analyze")
        .json(&json!({ "requestId": id }))
        .await;

    again.assert_status(StatusCode::CONFLICT);
    assert!(again.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_analyze_unknown_roast_is_not_found() {
    let app = create_test_app().await;

    app.server
        .post("/v1/analyze")
        .json(&json!({ "requestId": Uuid::new_v4() }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_roast_is_private_to_its_session() {
    let app = create_test_app().await;
    let id = anonymous_roast(&app, "private-session").await;

    app.server
        .get(&format!("/v1/roasts/{}", id))
        .add_header("X-Session-Id", "someone-else")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_can_delete_roast() {
    let app = create_test_app().await;
    let id = anonymous_roast(&app, "delete-session").await;

    app.server
        .delete(&format!("/v1/roasts/{}", id))
        .add_header("X-Session-Id", "delete-session")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/v1/roasts/{}", id))
        .add_header("X-Session-Id", "delete-session")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upgrade_banner_dismissal_persists() {
    let app = create_test_app().await;
    let token = signup(&app, "pref@b.io").await;
    let auth = format!("Bearer {}", token);

    let me: Value = app
        .server
        .get("/v1/me")
        .add_header("Authorization", auth.clone())
        .await
        .json();
    assert_eq!(me["upgradeBannerDismissed"], false);

    app.server
        .post("/v1/me/upgrade-banner/dismiss")
        .add_header("Authorization", auth.clone())
        .await
        .assert_status_ok();

    let me: Value = app
        .server
        .get("/v1/me")
        .add_header("Authorization", auth)
        .await
        .json();
    assert_eq!(me["upgradeBannerDismissed"], true);
}

#[tokio::test]
async fn test_webhook_with_bad_signature_is_rejected() {
    let app = create_test_app().await;

    app.server
        .post("/v1/webhooks/payments")
        .add_header("Stripe-Signature", "t=1,v1=deadbeef")
        .json(&json!({ "type": "checkout.session.completed" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/v1/webhooks/payments")
        .json(&json!({ "type": "checkout.session.completed" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = create_test_app().await;
    signup(&app, "dup@b.io").await;

    app.server
        .post("/v1/auth/signup")
        .json(&json!({ "email": "DUP@b.io" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}
