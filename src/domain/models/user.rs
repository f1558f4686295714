// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// 是否已购买 Pro
    pub is_pro: bool,
    /// 是否已关闭升级提示
    pub upgrade_banner_dismissed: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            is_pro: false,
            upgrade_banner_dismissed: false,
            created_at: Utc::now(),
        }
    }
}

/// 当前请求的调用者身份
///
/// 由认证中间件解析：可能是已登录用户、匿名会话，或两者都有
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub user: Option<User>,
    pub session_id: Option<String>,
}

impl Identity {
    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// API 密钥前缀
pub const API_KEY_PREFIX: &str = "wr_";
const API_KEY_RANDOM_LEN: usize = 40;

/// 生成新的 API 密钥
pub fn generate_api_key() -> String {
    let random: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(API_KEY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", API_KEY_PREFIX, random)
}
