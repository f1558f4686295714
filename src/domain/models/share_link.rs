// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 分享ID长度
pub const SHARE_ID_LEN: usize = 10;

/// 分享链接
///
/// 每个 roast 最多一个分享链接，`share_id` 是公开的不可猜测标识
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub share_id: String,
    pub roast_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    /// 为 roast 生成新的分享链接
    pub fn new(roast_id: Uuid) -> Self {
        Self {
            share_id: generate_share_id(),
            roast_id,
            created_at: Utc::now(),
        }
    }
}

/// 生成随机字母数字分享ID
pub fn generate_share_id() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(SHARE_ID_LEN)
        .map(char::from)
        .collect()
}
