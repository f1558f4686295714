// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// 支付错误类型
#[derive(Error, Debug)]
pub enum PaymentError {
    /// 未配置支付密钥
    #[error("Payment provider not configured: {0}")]
    NotConfigured(String),
    /// Webhook 签名无效或过期
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),
    /// Webhook 负载无法解析
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
    /// 服务商返回错误
    #[error("Payment provider error: {0}")]
    Provider(String),
}

/// 创建结账会话的参数
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub email: String,
    /// 触发升级的 roast（可选）
    pub roast_id: Option<Uuid>,
    pub amount_cents: i64,
    pub currency: String,
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// 服务商返回的结账会话
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// 服务商会话ID
    pub id: String,
    /// 跳转地址
    pub url: String,
}

/// 经过验签的 webhook 事件
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    /// 结账完成
    CheckoutCompleted {
        session_id: String,
        user_id: Option<Uuid>,
    },
    /// 不处理的事件类型
    Ignored { event_type: String },
}

/// 支付网关特质
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// 创建结账会话
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// 验证签名并解析 webhook 事件
    ///
    /// # 参数
    ///
    /// * `signature_header` - 服务商签名头
    /// * `payload` - 原始请求体
    fn parse_webhook(
        &self,
        signature_header: &str,
        payload: &[u8],
    ) -> Result<PaymentEvent, PaymentError>;

    /// 密钥是否已配置
    fn is_configured(&self) -> bool;
}
