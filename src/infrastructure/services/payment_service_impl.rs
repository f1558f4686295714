// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::settings::PaymentSettings;
use crate::domain::services::payment_service::{
    CheckoutRequest, CheckoutSession, PaymentError, PaymentEvent, PaymentGateway,
};

type HmacSha256 = Hmac<Sha256>;

/// Stripe 兼容的支付网关实现
///
/// 结账会话通过表单 POST 创建，webhook 使用 `t=<ts>,v1=<hex>` 形式的签名头
pub struct StripeGateway {
    /// HTTP 客户端
    client: reqwest::Client,
    /// API 基础 URL
    api_base_url: String,
    /// 私钥
    secret_key: Option<String>,
    /// Webhook 签名密钥
    webhook_secret: Option<String>,
    /// 签名时间戳容忍度（秒）
    tolerance_secs: i64,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

impl StripeGateway {
    pub fn new(settings: &PaymentSettings) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        Ok(Self {
            client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            secret_key: settings.secret_key.clone().filter(|k| !k.is_empty()),
            webhook_secret: settings.webhook_secret.clone().filter(|k| !k.is_empty()),
            tolerance_secs: settings.signature_tolerance_secs,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| PaymentError::NotConfigured("secret key missing".to_string()))?;

        let user_id = request.user_id.to_string();
        let amount = request.amount_cents.to_string();
        let roast_id = request.roast_id.map(|id| id.to_string()).unwrap_or_default();
        let form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", &request.success_url),
            ("cancel_url", &request.cancel_url),
            ("client_reference_id", &user_id),
            ("customer_email", &request.email),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", &request.currency),
            ("line_items[0][price_data][unit_amount]", &amount),
            (
                "line_items[0][price_data][product_data][name]",
                &request.product_name,
            ),
            ("metadata[user_id]", &user_id),
            ("metadata[roast_id]", &roast_id),
        ];

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base_url))
            .bearer_auth(secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!(
                "checkout session creation failed with status {}: {}",
                status, body
            )));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Provider(format!("unreadable session response: {}", e)))?;
        let url = session.url.ok_or_else(|| {
            PaymentError::Provider("checkout session has no redirect url".to_string())
        })?;

        debug!("Created checkout session {} for {}", session.id, request.user_id);
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    fn parse_webhook(
        &self,
        signature_header: &str,
        payload: &[u8],
    ) -> Result<PaymentEvent, PaymentError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| PaymentError::NotConfigured("webhook secret missing".to_string()))?;

        verify_signature(
            signature_header,
            payload,
            secret,
            self.tolerance_secs,
            Utc::now().timestamp(),
        )?;

        parse_event(payload)
    }

    fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }
}

/// 为负载生成签名
pub fn generate_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// 校验 `t=<ts>,v1=<hex>` 签名头
///
/// 任意一个 v1 签名匹配且时间戳在容忍范围内即通过
pub fn verify_signature(
    header: &str,
    payload: &[u8],
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature(
            "missing v1 signature".to_string(),
        ));
    }
    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(PaymentError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let matched = signatures.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        warn!("Rejected payment webhook with mismatched signature");
        Err(PaymentError::InvalidSignature(
            "signature mismatch".to_string(),
        ))
    }
}

fn parse_event(payload: &[u8]) -> Result<PaymentEvent, PaymentError> {
    let event: Value = serde_json::from_slice(payload)
        .map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;

    let event_type = event["type"]
        .as_str()
        .ok_or_else(|| PaymentError::InvalidPayload("missing event type".to_string()))?;

    if event_type != "checkout.session.completed" {
        return Ok(PaymentEvent::Ignored {
            event_type: event_type.to_string(),
        });
    }

    let object = &event["data"]["object"];
    let session_id = object["id"]
        .as_str()
        .ok_or_else(|| PaymentError::InvalidPayload("missing session id".to_string()))?
        .to_string();
    let user_id = object["client_reference_id"]
        .as_str()
        .or_else(|| object["metadata"]["user_id"].as_str())
        .and_then(|s| Uuid::parse_str(s).ok());

    Ok(PaymentEvent::CheckoutCompleted {
        session_id,
        user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "whsec_test";

    fn settings(base_url: &str) -> PaymentSettings {
        PaymentSettings {
            secret_key: Some("sk_test_123".to_string()),
            webhook_secret: Some(SECRET.to_string()),
            api_base_url: base_url.to_string(),
            price_cents: 2900,
            currency: "usd".to_string(),
            product_name: "Web3 ROAST Pro".to_string(),
            success_url: "https://app.test/success".to_string(),
            cancel_url: "https://app.test/cancel".to_string(),
            signature_tolerance_secs: 300,
        }
    }

    fn checkout_request() -> CheckoutRequest {
        CheckoutRequest {
            user_id: Uuid::new_v4(),
            email: "buyer@example.com".to_string(),
            roast_id: None,
            amount_cents: 2900,
            currency: "usd".to_string(),
            product_name: "Web3 ROAST Pro".to_string(),
            success_url: "https://app.test/success".to_string(),
            cancel_url: "https://app.test/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_checkout_session_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(body_string_contains("mode=payment"))
            .and(body_string_contains("unit_amount%5D=2900"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_abc",
                "url": "https://checkout.test/pay/cs_test_abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(&settings(&server.uri())).unwrap();
        let session = gateway
            .create_checkout_session(&checkout_request())
            .await
            .unwrap();

        assert_eq!(session.id, "cs_test_abc");
        assert_eq!(session.url, "https://checkout.test/pay/cs_test_abc");
    }

    #[tokio::test]
    async fn test_create_checkout_session_surfaces_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid currency"))
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(&settings(&server.uri())).unwrap();
        let err = gateway
            .create_checkout_session(&checkout_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Provider(_)));
        assert!(err.to_string().contains("invalid currency"));
    }

    #[test]
    fn test_verify_signature_accepts_valid_header() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let signature = generate_signature(SECRET, 1_700_000_000, payload);
        let header = format!("t=1700000000,v1=deadbeef,v1={}", signature);

        assert!(verify_signature(&header, payload, SECRET, 300, 1_700_000_100).is_ok());
    }

    #[test]
    fn test_verify_signature_rejects_tampering_and_stale_timestamps() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let signature = generate_signature(SECRET, 1_700_000_000, payload);
        let header = format!("t=1700000000,v1={}", signature);

        let tampered = br#"{"type":"checkout.session.expired"}"#;
        assert!(matches!(
            verify_signature(&header, tampered, SECRET, 300, 1_700_000_000),
            Err(PaymentError::InvalidSignature(_))
        ));
        assert!(matches!(
            verify_signature(&header, payload, SECRET, 300, 1_700_000_301),
            Err(PaymentError::InvalidSignature(_))
        ));
        assert!(matches!(
            verify_signature(&header, payload, "other", 300, 1_700_000_000),
            Err(PaymentError::InvalidSignature(_))
        ));
        assert!(verify_signature("garbage", payload, SECRET, 300, 0).is_err());
    }

    #[test]
    fn test_verify_signature_rejects_extreme_timestamps() {
        let payload = br#"{"type":"checkout.session.completed"}"#;

        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={},v1={}", t, generate_signature(SECRET, t, payload));
            assert!(matches!(
                verify_signature(&header, payload, SECRET, 300, 1_700_000_000),
                Err(PaymentError::InvalidSignature(_))
            ));
        }
    }

    #[test]
    fn test_parse_webhook_extracts_completed_session() {
        let gateway = StripeGateway::new(&settings("http://127.0.0.1:9")).unwrap();
        let user_id = Uuid::new_v4();
        let payload = json!({
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_1", "client_reference_id": user_id.to_string() } }
        })
        .to_string();
        let now = Utc::now().timestamp();
        let header = format!(
            "t={},v1={}",
            now,
            generate_signature(SECRET, now, payload.as_bytes())
        );

        let event = gateway.parse_webhook(&header, payload.as_bytes()).unwrap();
        assert_eq!(
            event,
            PaymentEvent::CheckoutCompleted {
                session_id: "cs_1".to_string(),
                user_id: Some(user_id),
            }
        );

        let other = json!({ "type": "invoice.paid" }).to_string();
        let header = format!(
            "t={},v1={}",
            now,
            generate_signature(SECRET, now, other.as_bytes())
        );
        assert!(matches!(
            gateway.parse_webhook(&header, other.as_bytes()).unwrap(),
            PaymentEvent::Ignored { .. }
        ));
    }
}
