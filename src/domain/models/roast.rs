// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::analysis::AnalysisResult;

/// Roast 实体（一次分析请求）
///
/// 表示用户提交的一个网址及其分析生命周期。记录由创建者拥有：
/// 已登录用户（`user_id`）或匿名会话（`session_id`）。匿名记录可以被
/// 登录用户认领一次，认领后原记录保留并标记为已认领。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Roast {
    /// 唯一标识符
    pub id: Uuid,
    /// 目标网址（http/https）
    pub url: String,
    /// 当前状态
    pub status: RoastStatus,
    /// 截图公开URL，截图成功前为空
    pub screenshot_url: Option<String>,
    /// 规范化后的分析结果
    pub result: Option<AnalysisResult>,
    /// 总分，始终等于 `result.overall_score`
    pub score: Option<u8>,
    /// 错误信息，仅在 failed 状态下设置
    pub error_message: Option<String>,
    /// 拥有者用户ID
    pub user_id: Option<Uuid>,
    /// 匿名会话令牌
    #[serde(skip_serializing)]
    pub session_id: Option<String>,
    /// 认领该匿名记录的用户ID
    pub claimed_by_user_id: Option<Uuid>,
    /// 认领时间
    pub claimed_at: Option<DateTime<Utc>>,
    /// 若此记录由认领产生，指向原匿名记录
    pub claimed_from: Option<Uuid>,
    /// 已执行分析的次数
    pub attempt_count: i32,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
    /// 完成时间，只在进入 completed 时设置一次
    pub completed_at: Option<DateTime<Utc>>,
}

/// Roast 状态枚举
///
/// 单次运行内的状态流转：
/// Pending → Processing → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoastStatus {
    /// 已创建，等待分析
    #[default]
    Pending,
    /// 分析进行中
    Processing,
    /// 分析完成
    Completed,
    /// 分析失败
    Failed,
}

impl RoastStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoastStatus::Completed | RoastStatus::Failed)
    }

    /// 是否允许转换到 `next`
    pub fn can_transition_to(&self, next: RoastStatus) -> bool {
        matches!(
            (self, next),
            (RoastStatus::Pending, RoastStatus::Processing)
                | (RoastStatus::Processing, RoastStatus::Completed)
                | (RoastStatus::Processing, RoastStatus::Failed)
        )
    }
}

impl fmt::Display for RoastStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoastStatus::Pending => write!(f, "pending"),
            RoastStatus::Processing => write!(f, "processing"),
            RoastStatus::Completed => write!(f, "completed"),
            RoastStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RoastStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RoastStatus::Pending),
            "processing" => Ok(RoastStatus::Processing),
            "completed" => Ok(RoastStatus::Completed),
            "failed" => Ok(RoastStatus::Failed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: RoastStatus, to: RoastStatus },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 存储中出现未知的状态值
    #[error("Unknown roast status: {0}")]
    UnknownStatus(String),
}

impl Roast {
    fn new(url: String, user_id: Option<Uuid>, session_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            url,
            status: RoastStatus::Pending,
            screenshot_url: None,
            result: None,
            score: None,
            error_message: None,
            user_id,
            session_id,
            claimed_by_user_id: None,
            claimed_at: None,
            claimed_from: None,
            attempt_count: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// 为登录用户创建 roast
    pub fn new_for_user(url: String, user_id: Uuid) -> Self {
        Self::new(url, Some(user_id), None)
    }

    /// 为匿名会话创建 roast
    pub fn new_anonymous(url: String, session_id: String) -> Self {
        Self::new(url, None, Some(session_id))
    }

    /// 是否为匿名记录
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    /// 是否已被认领
    pub fn is_claimed(&self) -> bool {
        self.claimed_by_user_id.is_some()
    }

    /// 用户是否拥有该记录
    pub fn is_owned_by_user(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }

    /// 匿名会话是否拥有该记录（已认领的记录不再属于会话）
    pub fn is_owned_by_session(&self, session_id: &str) -> bool {
        self.is_anonymous() && !self.is_claimed() && self.session_id.as_deref() == Some(session_id)
    }

    fn transition(&mut self, to: RoastStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 开始分析：Pending → Processing
    pub fn start(mut self) -> Result<Self, DomainError> {
        self.transition(RoastStatus::Processing)?;
        self.attempt_count += 1;
        Ok(self)
    }

    /// 完成分析：Processing → Completed
    ///
    /// 同时写入截图URL、结果、总分和完成时间
    pub fn complete(
        mut self,
        screenshot_url: String,
        result: AnalysisResult,
    ) -> Result<Self, DomainError> {
        self.transition(RoastStatus::Completed)?;
        self.screenshot_url = Some(screenshot_url);
        self.score = Some(result.overall_score);
        self.result = Some(result);
        self.error_message = None;
        self.completed_at = Some(self.updated_at);
        Ok(self)
    }

    /// 标记失败：Processing → Failed
    pub fn fail(mut self, message: impl Into<String>) -> Result<Self, DomainError> {
        self.transition(RoastStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(self)
    }

    /// 重置失败记录以便重新分析：Failed → Pending
    ///
    /// 这是运行之外的显式操作，清除上一次运行留下的部分结果
    pub fn reset_for_retry(mut self) -> Result<Self, DomainError> {
        if self.status != RoastStatus::Failed {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: RoastStatus::Pending,
            });
        }
        self.status = RoastStatus::Pending;
        self.error_message = None;
        self.result = None;
        self.score = None;
        self.screenshot_url = None;
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// 为认领者生成归属于 `user_id` 的记录副本
    ///
    /// 只允许认领已完成、未被认领的匿名记录
    pub fn claim_copy(&self, user_id: Uuid) -> Result<Roast, DomainError> {
        if !self.is_anonymous() {
            return Err(DomainError::ValidationError(
                "roast is not anonymous".to_string(),
            ));
        }
        if self.is_claimed() {
            return Err(DomainError::ValidationError(
                "roast has already been claimed".to_string(),
            ));
        }
        if self.status != RoastStatus::Completed {
            return Err(DomainError::ValidationError(format!(
                "only completed roasts can be claimed (status: {})",
                self.status
            )));
        }

        let mut owned = self.clone();
        owned.id = Uuid::new_v4();
        owned.user_id = Some(user_id);
        owned.session_id = None;
        owned.claimed_from = Some(self.id);
        owned.updated_at = Utc::now();
        Ok(owned)
    }
}
