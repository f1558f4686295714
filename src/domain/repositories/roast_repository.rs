// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::roast::Roast;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 条件更新未命中（状态已被其他请求改变）
    #[error("Conflict: {0}")]
    Conflict(String),
    /// 存储中的记录无法转换为领域对象
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// 用户 roast 列表排序方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoastSort {
    /// 按创建时间倒序
    #[default]
    Newest,
    /// 按分数倒序
    Score,
}

/// Roast 仓库特质
///
/// 定义 roast 数据访问接口
#[async_trait]
pub trait RoastRepository: Send + Sync {
    /// 创建新 roast
    async fn create(&self, roast: &Roast) -> Result<Roast, RepositoryError>;

    /// 根据ID查找 roast
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Roast>, RepositoryError>;

    /// 整体更新 roast
    async fn update(&self, roast: &Roast) -> Result<Roast, RepositoryError>;

    /// 条件更新 pending → processing
    ///
    /// 记录不是 pending 时返回 `Conflict`，不存在时返回 `NotFound`
    async fn start_processing(&self, id: Uuid) -> Result<Roast, RepositoryError>;

    /// 条件更新 failed → pending，清除上一次运行留下的结果
    ///
    /// 记录不是 failed 时返回 `Conflict`，不存在时返回 `NotFound`
    async fn reset_failed(&self, id: Uuid) -> Result<Roast, RepositoryError>;

    /// 写入截图URL（完成前的部分提交）
    async fn set_screenshot_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError>;

    /// 标记匿名 roast 已被认领
    ///
    /// 已被认领时返回 `Conflict`
    async fn mark_claimed(
        &self,
        id: Uuid,
        user_id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// 撤销由 `user_id` 完成的认领，返回是否撤销了记录
    async fn release_claim(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError>;

    /// 列出用户的 roast
    async fn list_by_user(
        &self,
        user_id: Uuid,
        sort: RoastSort,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Roast>, RepositoryError>;

    /// 统计匿名会话创建的 roast 数
    async fn count_by_session(&self, session_id: &str) -> Result<u64, RepositoryError>;

    /// 删除 roast，返回是否删除了记录
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}
