// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::user::User;
use crate::domain::repositories::roast_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 用户仓库特质
///
/// 同时负责 API 密钥与用户的映射
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户，邮箱已存在时返回 `Conflict`
    async fn create(&self, user: &User) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// 更新 Pro 状态
    async fn set_pro(&self, id: Uuid, is_pro: bool) -> Result<(), RepositoryError>;

    /// 关闭升级提示
    async fn dismiss_upgrade_banner(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 为用户登记 API 密钥
    async fn create_api_key(&self, key: &str, user_id: Uuid) -> Result<(), RepositoryError>;

    /// 根据 API 密钥查找用户
    async fn find_by_api_key(&self, key: &str) -> Result<Option<User>, RepositoryError>;
}
