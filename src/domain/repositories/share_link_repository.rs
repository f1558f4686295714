// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::share_link::ShareLink;
use crate::domain::repositories::roast_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 分享链接仓库特质
#[async_trait]
pub trait ShareLinkRepository: Send + Sync {
    /// 创建分享链接
    ///
    /// 同一 roast 已存在链接时返回 `Conflict`
    async fn create(&self, link: &ShareLink) -> Result<ShareLink, RepositoryError>;

    /// 根据分享ID查找
    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<ShareLink>, RepositoryError>;

    /// 根据 roast ID 查找
    async fn find_by_roast_id(&self, roast_id: Uuid) -> Result<Option<ShareLink>, RepositoryError>;

    /// 删除 roast 的分享链接
    async fn delete_by_roast_id(&self, roast_id: Uuid) -> Result<(), RepositoryError>;
}
