// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::repositories::roast_repository::RoastSort;

/// 创建 roast 请求
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoastRequestDto {
    #[validate(url, length(max = 2048))]
    pub url: String,
    /// 匿名会话ID，未登录时必填
    #[validate(length(min = 8, max = 128))]
    pub session_id: Option<String>,
}

/// 触发分析请求
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequestDto {
    pub request_id: Uuid,
}

/// 触发分析响应
#[derive(Debug, Deserialize, Serialize)]
pub struct AnalyzeResponseDto {
    pub success: bool,
    pub id: Uuid,
    pub score: Option<u8>,
}

/// 认领匿名 roast 请求
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRoastRequestDto {
    pub request_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
}

/// 列表查询参数
#[derive(Debug, Deserialize, Validate)]
pub struct ListRoastsQuery {
    #[serde(default)]
    pub sort: RoastSort,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// 分享链接响应
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponseDto {
    pub share_id: String,
}
