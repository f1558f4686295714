// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::purchase::Purchase;
use crate::domain::repositories::roast_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 购买记录仓库特质
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn create(&self, purchase: &Purchase) -> Result<Purchase, RepositoryError>;

    async fn find_by_provider_session(
        &self,
        provider_session_id: &str,
    ) -> Result<Option<Purchase>, RepositoryError>;

    /// 条件更新 pending → completed
    ///
    /// 返回是否发生了状态变化，重复回调时为 false
    async fn mark_completed(
        &self,
        provider_session_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Purchase>, RepositoryError>;
}
