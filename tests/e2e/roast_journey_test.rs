// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{create_test_app, signup, WEBHOOK_SECRET};
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use web3roast::infrastructure::services::payment_service_impl::generate_signature;

const SESSION: &str = "anon-session-e2e";

/// 匿名提交 → 分析完成 → 注册 → 认领，认领后的记录结果与原件一致
#[tokio::test]
async fn test_anonymous_roast_then_claim() {
    let app = create_test_app().await;

    let created = app
        .server
        .post("/v1/roasts")
        .add_header("X-Session-Id", SESSION)
        .json(&json!({ "url": "https://example.com" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let created: Value = created.json();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "pending");
    assert_eq!(created["view"]["state"], "loading");

    let analyzed = app
        .server
        .post("/v1/analyze")
        .json(&json!({ "requestId": id }))
        .await;
    analyzed.assert_status_ok();
    let analyzed: Value = analyzed.json();
    assert_eq!(analyzed["success"], true);

    // 客户端轮询直到完成
    let mut original = Value::Null;
    for _ in 0..10 {
        let polled: Value = app
            .server
            .get(&format!("/v1/roasts/{}", id))
            .add_header("X-Session-Id", SESSION)
            .await
            .json();
        if polled["status"] == "completed" {
            original = polled;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(original["status"], "completed");
    assert_eq!(original["view"]["state"], "result");
    let score = original["score"].as_u64().unwrap();
    assert!(score <= 100);
    assert_eq!(original["result"]["overallScore"].as_u64(), Some(score));
    assert_eq!(
        original["result"]["findings"].as_array().unwrap().len(),
        original["result"]["categoryScores"]
            .as_object()
            .unwrap()
            .len()
    );
    assert!(original["completedAt"].is_string());
    assert_eq!(app.storage.len(), 1);

    let token = signup(&app, "founder@protocol.xyz").await;
    let claimed = app
        .server
        .post("/v1/roasts/claim")
        .add_header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "requestId": id, "sessionId": SESSION }))
        .await;
    claimed.assert_status(StatusCode::CREATED);
    let claimed: Value = claimed.json();

    assert_ne!(claimed["id"], original["id"]);
    assert_eq!(claimed["claimedFrom"].as_str(), Some(id.as_str()));
    assert_eq!(claimed["result"], original["result"]);
    assert_eq!(claimed["score"], original["score"]);

    let dashboard: Value = app
        .server
        .get("/v1/roasts")
        .add_header("Authorization", format!("Bearer {}", token))
        .await
        .json();
    let dashboard = dashboard.as_array().unwrap();
    assert_eq!(dashboard.len(), 1);
    assert_eq!(dashboard[0]["id"], claimed["id"]);
}

/// 完成的 roast 可以分享，公开读取不需要身份
#[tokio::test]
async fn test_share_completed_roast() {
    let app = create_test_app().await;
    let token = signup(&app, "builder@dao.xyz").await;
    let auth = format!("Bearer {}", token);

    let created: Value = app
        .server
        .post("/v1/roasts")
        .add_header("Authorization", auth.clone())
        .json(&json!({ "url": "https://example.com" }))
        .await
        .json();
    let id = created["id"].as_str().unwrap().to_string();

    app.server
        .post("/v1/analyze")
        .json(&json!({ "requestId": id }))
        .await
        .assert_status_ok();

    let first: Value = app
        .server
        .post(&format!("/v1/roasts/{}/share", id))
        .add_header("Authorization", auth.clone())
        .await
        .json();
    let second: Value = app
        .server
        .post(&format!("/v1/roasts/{}/share", id))
        .add_header("Authorization", auth.clone())
        .await
        .json();
    assert_eq!(first["shareId"], second["shareId"]);

    let shared = app
        .server
        .get(&format!("/v1/share/{}", first["shareId"].as_str().unwrap()))
        .await;
    shared.assert_status_ok();
    let shared: Value = shared.json();
    assert_eq!(shared["roastId"].as_str(), Some(id.as_str()));
    assert_eq!(shared["score"], 64);
}

/// 结账 → 支付回调 → 用户变为 Pro
#[tokio::test]
async fn test_checkout_and_webhook_upgrade_user() {
    let app = create_test_app().await;
    let token = signup(&app, "whale@defi.xyz").await;
    let auth = format!("Bearer {}", token);

    let session = app
        .server
        .post("/v1/checkout")
        .add_header("Authorization", auth.clone())
        .json(&json!({}))
        .await;
    session.assert_status_ok();
    let session: Value = session.json();
    assert_eq!(session["id"], "cs_test_e2e");
    assert_eq!(session["url"], "https://checkout.test/pay/cs_test_e2e");

    let payload = json!({
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_test_e2e" } }
    })
    .to_string();
    let ts = Utc::now().timestamp();
    let signature = format!(
        "t={},v1={}",
        ts,
        generate_signature(WEBHOOK_SECRET, ts, payload.as_bytes())
    );

    let ack = app
        .server
        .post("/v1/webhooks/payments")
        .add_header("Stripe-Signature", signature)
        .bytes(payload.into_bytes().into())
        .await;
    ack.assert_status_ok();
    assert_eq!(ack.json::<Value>()["received"], true);

    let me: Value = app
        .server
        .get("/v1/me")
        .add_header("Authorization", auth)
        .await
        .json();
    assert_eq!(me["isPro"], true);
}
