// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::roast_result::RoastResultRecord;
use crate::domain::repositories::roast_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 结果快照仓库特质
#[async_trait]
pub trait RoastResultRepository: Send + Sync {
    /// 写入或覆盖结果快照
    async fn upsert(&self, record: &RoastResultRecord) -> Result<(), RepositoryError>;

    /// 根据 roast ID 查找快照
    async fn find_by_roast_id(
        &self,
        roast_id: Uuid,
    ) -> Result<Option<RoastResultRecord>, RepositoryError>;

    /// 删除快照
    async fn delete_by_roast_id(&self, roast_id: Uuid) -> Result<(), RepositoryError>;
}
