// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::roast_result::RoastResultRecord;
use crate::domain::repositories::roast_repository::RepositoryError;
use crate::domain::repositories::roast_result_repository::RoastResultRepository;
use crate::infrastructure::database::entities::roast_result;
use async_trait::async_trait;
use sea_orm::{sea_query::OnConflict, *};
use std::sync::Arc;
use uuid::Uuid;

/// 结果快照仓库实现
#[derive(Clone)]
pub struct RoastResultRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl RoastResultRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoastResultRepository for RoastResultRepositoryImpl {
    async fn upsert(&self, record: &RoastResultRecord) -> Result<(), RepositoryError> {
        let result = serde_json::to_value(&record.result)
            .map_err(|e| RepositoryError::InvalidRecord(e.to_string()))?;

        let model = roast_result::ActiveModel {
            roast_id: Set(record.roast_id),
            url: Set(record.url.clone()),
            screenshot_url: Set(Some(record.screenshot_url.clone())),
            score: Set(i32::from(record.score)),
            result: Set(result),
            created_at: Set(record.created_at.into()),
        };

        roast_result::Entity::insert(model)
            .on_conflict(
                OnConflict::column(roast_result::Column::RoastId)
                    .update_columns([
                        roast_result::Column::Url,
                        roast_result::Column::ScreenshotUrl,
                        roast_result::Column::Score,
                        roast_result::Column::Result,
                        roast_result::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn find_by_roast_id(
        &self,
        roast_id: Uuid,
    ) -> Result<Option<RoastResultRecord>, RepositoryError> {
        roast_result::Entity::find_by_id(roast_id)
            .one(self.db.as_ref())
            .await?
            .map(RoastResultRecord::try_from)
            .transpose()
    }

    async fn delete_by_roast_id(&self, roast_id: Uuid) -> Result<(), RepositoryError> {
        roast_result::Entity::delete_by_id(roast_id)
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}

impl TryFrom<roast_result::Model> for RoastResultRecord {
    type Error = RepositoryError;

    fn try_from(model: roast_result::Model) -> Result<Self, Self::Error> {
        let result = serde_json::from_value(model.result).map_err(|e| {
            RepositoryError::InvalidRecord(format!("result for roast {}: {}", model.roast_id, e))
        })?;

        Ok(Self {
            roast_id: model.roast_id,
            url: model.url,
            screenshot_url: model.screenshot_url.unwrap_or_default(),
            score: model.score.clamp(0, 100) as u8,
            result,
            created_at: model.created_at.into(),
        })
    }
}
