// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::roast::DomainError;

/// 购买记录
///
/// 结账会话创建时写入 pending，支付回调确认后变为 completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    /// 触发购买的 roast（可选）
    pub roast_id: Option<Uuid>,
    /// 支付服务商的会话ID
    pub provider_session_id: String,
    pub status: PurchaseStatus,
    pub amount_cents: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 购买状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Completed,
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PurchaseStatus::Pending => write!(f, "pending"),
            PurchaseStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for PurchaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

impl Purchase {
    pub fn new(
        user_id: Uuid,
        roast_id: Option<Uuid>,
        provider_session_id: String,
        amount_cents: i64,
        currency: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            roast_id,
            provider_session_id,
            status: PurchaseStatus::Pending,
            amount_cents,
            currency,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
