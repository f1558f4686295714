// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;
use web3roast::app::AppDependencies;
use web3roast::config::settings::Settings;
use web3roast::infrastructure::database::connection;
use web3roast::infrastructure::storage::InMemoryStorage;
use web3roast::presentation::routes;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WEBHOOK_SECRET: &str = "whsec_test";

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseConnection>,
    pub storage: Arc<InMemoryStorage>,
    pub screenshot_api: MockServer,
    pub llm_api: MockServer,
    pub payment_api: MockServer,
}

/// 模型返回的原始 JSON
pub fn model_payload(score: u64) -> Value {
    let section = |s: u64| json!({ "score": s, "feedback": "Say what the protocol does." });
    json!({
        "overallScore": score,
        "heroSection": section(score),
        "trustSocialProof": section(35),
        "messagingClarity": section(score),
        "ctaStrategy": section(80),
        "visualFlow": section(60),
        "web3Relevance": section(90),
        "fixes": ["Show audits above the fold"],
        "rewriteSuggestion": {
            "headline": "Bridge in one click",
            "subheadline": "Audited and non-custodial",
            "cta": "Start bridging"
        }
    })
}

pub async fn create_test_app() -> TestApp {
    let screenshot_api = MockServer::start().await;
    let llm_api = MockServer::start().await;
    let payment_api = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/take"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"\xFF\xD8\xFFfake-jpeg".to_vec()),
        )
        .mount(&screenshot_api)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": model_payload(64).to_string() } }],
            "usage": { "prompt_tokens": 900, "completion_tokens": 250, "total_tokens": 1150 }
        })))
        .mount(&llm_api)
        .await;

    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_e2e",
            "url": "https://checkout.test/pay/cs_test_e2e"
        })))
        .mount(&payment_api)
        .await;

    let screenshot_uri = screenshot_api.uri();
    let llm_uri = llm_api.uri();
    let payment_uri = payment_api.uri();
    let settings = Settings::with_overrides(&[
        ("database.url", "sqlite::memory:"),
        ("database.max_connections", "1"),
        ("database.min_connections", "1"),
        ("screenshot.api_key", "shot-key"),
        ("screenshot.api_base_url", screenshot_uri.as_str()),
        ("llm.api_key", "sk-test"),
        ("llm.api_base_url", llm_uri.as_str()),
        ("llm.retry_delay_ms", "1"),
        ("scraper.max_retries", "0"),
        ("scraper.timeout_secs", "2"),
        ("payments.secret_key", "sk_test_payments"),
        ("payments.webhook_secret", WEBHOOK_SECRET),
        ("payments.api_base_url", payment_uri.as_str()),
        ("metrics.enabled", "false"),
    ])
    .expect("test settings");

    let db = Arc::new(
        connection::connect_and_migrate(&settings.database)
            .await
            .expect("in-memory database"),
    );
    let storage = Arc::new(InMemoryStorage::new());
    let deps = AppDependencies::from_settings(&settings, db.clone(), storage.clone())
        .expect("app dependencies");
    let server = TestServer::new(routes::routes(deps)).expect("test server");

    TestApp {
        server,
        db,
        storage,
        screenshot_api,
        llm_api,
        payment_api,
    }
}

/// 注册用户并返回 bearer 令牌
pub async fn signup(app: &TestApp, email: &str) -> String {
    let response = app
        .server
        .post("/v1/auth/signup")
        .json(&json!({ "email": email }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    body["token"]
        .as_str()
        .expect("token in signup response")
        .to_string()
}
