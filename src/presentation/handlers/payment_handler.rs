// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    body::Bytes,
    extract::{Extension, Json},
    http::HeaderMap,
};
use std::sync::Arc;
use tracing::warn;

use crate::application::dto::account_request::{CheckoutRequestDto, WebhookAckDto};
use crate::application::use_cases::payment_use_case::PaymentUseCase;
use crate::domain::services::payment_service::CheckoutSession;
use crate::presentation::errors::AppError;
use crate::presentation::extractors::current_user::Caller;
use crate::utils::errors::RoastError;

/// 支付服务商签名头
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// 创建结账会话
pub async fn checkout(
    Extension(use_case): Extension<Arc<PaymentUseCase>>,
    Caller(identity): Caller,
    Json(payload): Json<CheckoutRequestDto>,
) -> Result<Json<CheckoutSession>, AppError> {
    Ok(Json(use_case.checkout(&identity, payload).await?))
}

/// 支付回调，原始请求体用于验签
pub async fn payment_webhook(
    Extension(use_case): Extension<Arc<PaymentUseCase>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckDto>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            warn!("Payment webhook without signature header");
            RoastError::Validation("missing signature header".to_string())
        })?;

    use_case.handle_webhook(signature, &body).await?;
    Ok(Json(WebhookAckDto { received: true }))
}
