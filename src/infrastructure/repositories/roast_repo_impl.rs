// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::roast::{DomainError, Roast, RoastStatus};
use crate::domain::repositories::roast_repository::{RepositoryError, RoastRepository, RoastSort};
use crate::infrastructure::database::entities::roast as roast_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{sea_query::Expr, *};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Roast 仓库实现
#[derive(Clone)]
pub struct RoastRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl RoastRepositoryImpl {
    /// 创建新的 roast 仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 条件更新未命中时区分记录不存在与状态冲突
    async fn conflict_or_not_found(&self, id: Uuid, reason: &str) -> RepositoryError {
        match self.find_by_id(id).await {
            Ok(Some(roast)) => {
                RepositoryError::Conflict(format!("{} (status: {})", reason, roast.status))
            }
            Ok(None) => RepositoryError::NotFound,
            Err(e) => e,
        }
    }
}

fn to_active_model(roast: &Roast) -> Result<roast_entity::ActiveModel, RepositoryError> {
    let result = roast
        .result
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| RepositoryError::InvalidRecord(e.to_string()))?;

    Ok(roast_entity::ActiveModel {
        id: Set(roast.id),
        url: Set(roast.url.clone()),
        status: Set(roast.status.to_string()),
        screenshot_url: Set(roast.screenshot_url.clone()),
        result: Set(result),
        score: Set(roast.score.map(i32::from)),
        error_message: Set(roast.error_message.clone()),
        user_id: Set(roast.user_id),
        session_id: Set(roast.session_id.clone()),
        claimed_by_user_id: Set(roast.claimed_by_user_id),
        claimed_at: Set(roast.claimed_at.map(Into::into)),
        claimed_from: Set(roast.claimed_from),
        attempt_count: Set(roast.attempt_count),
        created_at: Set(roast.created_at.into()),
        updated_at: Set(roast.updated_at.into()),
        completed_at: Set(roast.completed_at.map(Into::into)),
    })
}

#[async_trait]
impl RoastRepository for RoastRepositoryImpl {
    async fn create(&self, roast: &Roast) -> Result<Roast, RepositoryError> {
        to_active_model(roast)?.insert(self.db.as_ref()).await?;
        Ok(roast.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Roast>, RepositoryError> {
        roast_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Roast::try_from)
            .transpose()
    }

    async fn update(&self, roast: &Roast) -> Result<Roast, RepositoryError> {
        match to_active_model(roast)?.update(self.db.as_ref()).await {
            Ok(model) => Roast::try_from(model),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn start_processing(&self, id: Uuid) -> Result<Roast, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let result = roast_entity::Entity::update_many()
            .col_expr(
                roast_entity::Column::Status,
                Expr::value(RoastStatus::Processing.to_string()),
            )
            .col_expr(
                roast_entity::Column::AttemptCount,
                Expr::col(roast_entity::Column::AttemptCount).add(1),
            )
            .col_expr(roast_entity::Column::UpdatedAt, Expr::value(now))
            .filter(roast_entity::Column::Id.eq(id))
            .filter(roast_entity::Column::Status.eq(RoastStatus::Pending.to_string()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(self
                .conflict_or_not_found(id, "roast is not pending")
                .await);
        }

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn reset_failed(&self, id: Uuid) -> Result<Roast, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let result = roast_entity::Entity::update_many()
            .col_expr(
                roast_entity::Column::Status,
                Expr::value(RoastStatus::Pending.to_string()),
            )
            .col_expr(
                roast_entity::Column::ErrorMessage,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                roast_entity::Column::Result,
                Expr::value(Option::<serde_json::Value>::None),
            )
            .col_expr(roast_entity::Column::Score, Expr::value(Option::<i32>::None))
            .col_expr(
                roast_entity::Column::ScreenshotUrl,
                Expr::value(Option::<String>::None),
            )
            .col_expr(roast_entity::Column::UpdatedAt, Expr::value(now))
            .filter(roast_entity::Column::Id.eq(id))
            .filter(roast_entity::Column::Status.eq(RoastStatus::Failed.to_string()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(self.conflict_or_not_found(id, "roast is not failed").await);
        }

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn set_screenshot_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let result = roast_entity::Entity::update_many()
            .col_expr(roast_entity::Column::ScreenshotUrl, Expr::value(url))
            .col_expr(roast_entity::Column::UpdatedAt, Expr::value(now))
            .filter(roast_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn mark_claimed(
        &self,
        id: Uuid,
        user_id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let claimed_at: DateTime<FixedOffset> = claimed_at.into();
        let result = roast_entity::Entity::update_many()
            .col_expr(roast_entity::Column::ClaimedByUserId, Expr::value(user_id))
            .col_expr(roast_entity::Column::ClaimedAt, Expr::value(claimed_at))
            .col_expr(roast_entity::Column::UpdatedAt, Expr::value(claimed_at))
            .filter(roast_entity::Column::Id.eq(id))
            .filter(roast_entity::Column::ClaimedByUserId.is_null())
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(self
                .conflict_or_not_found(id, "roast has already been claimed")
                .await);
        }
        Ok(())
    }

    async fn release_claim(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let result = roast_entity::Entity::update_many()
            .col_expr(
                roast_entity::Column::ClaimedByUserId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                roast_entity::Column::ClaimedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(roast_entity::Column::UpdatedAt, Expr::value(now))
            .filter(roast_entity::Column::Id.eq(id))
            .filter(roast_entity::Column::ClaimedByUserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        sort: RoastSort,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Roast>, RepositoryError> {
        let mut query =
            roast_entity::Entity::find().filter(roast_entity::Column::UserId.eq(user_id));

        if sort == RoastSort::Score {
            query = query.order_by_desc(roast_entity::Column::Score);
        }

        query
            .order_by_desc(roast_entity::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Roast::try_from)
            .collect()
    }

    async fn count_by_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        Ok(roast_entity::Entity::find()
            .filter(roast_entity::Column::SessionId.eq(session_id))
            .count(self.db.as_ref())
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = roast_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

impl TryFrom<roast_entity::Model> for Roast {
    type Error = RepositoryError;

    fn try_from(model: roast_entity::Model) -> Result<Self, Self::Error> {
        let status: RoastStatus = model
            .status
            .parse()
            .map_err(|e: DomainError| {
                RepositoryError::InvalidRecord(format!("roast {}: {}", model.id, e))
            })?;

        // 结果无法解析时按“尚无结果”处理，由展示层显示加载状态
        let result = model.result.and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| warn!("Roast {} has an unreadable result: {}", model.id, e))
                .ok()
        });

        Ok(Self {
            id: model.id,
            url: model.url,
            status,
            screenshot_url: model.screenshot_url,
            result,
            score: model.score.map(|s| s.clamp(0, 100) as u8),
            error_message: model.error_message,
            user_id: model.user_id,
            session_id: model.session_id,
            claimed_by_user_id: model.claimed_by_user_id,
            claimed_at: model.claimed_at.map(Into::into),
            claimed_from: model.claimed_from,
            attempt_count: model.attempt_count,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            completed_at: model.completed_at.map(Into::into),
        })
    }
}
