// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::user::User;

/// 注册请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SignupRequestDto {
    #[validate(email)]
    pub email: String,
}

/// 注册响应，`token` 只在此处返回一次
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponseDto {
    pub user: User,
    pub token: String,
}

/// 结账请求
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequestDto {
    pub request_id: Option<Uuid>,
}

/// Webhook 处理结果
#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookAckDto {
    pub received: bool,
}
