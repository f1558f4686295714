// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::share_link::ShareLink;
use crate::domain::repositories::roast_repository::RepositoryError;
use crate::domain::repositories::share_link_repository::ShareLinkRepository;
use crate::infrastructure::database::entities::share_link;
use crate::infrastructure::repositories::map_unique_violation;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 分享链接仓库实现
#[derive(Clone)]
pub struct ShareLinkRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ShareLinkRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShareLinkRepository for ShareLinkRepositoryImpl {
    async fn create(&self, link: &ShareLink) -> Result<ShareLink, RepositoryError> {
        let model = share_link::ActiveModel {
            share_id: Set(link.share_id.clone()),
            roast_id: Set(link.roast_id),
            created_at: Set(link.created_at.into()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "share link already exists"))?;
        Ok(link.clone())
    }

    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<ShareLink>, RepositoryError> {
        let model = share_link::Entity::find_by_id(share_id.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_roast_id(&self, roast_id: Uuid) -> Result<Option<ShareLink>, RepositoryError> {
        let model = share_link::Entity::find()
            .filter(share_link::Column::RoastId.eq(roast_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn delete_by_roast_id(&self, roast_id: Uuid) -> Result<(), RepositoryError> {
        share_link::Entity::delete_many()
            .filter(share_link::Column::RoastId.eq(roast_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}

impl From<share_link::Model> for ShareLink {
    fn from(model: share_link::Model) -> Self {
        Self {
            share_id: model.share_id,
            roast_id: model.roast_id,
            created_at: model.created_at.into(),
        }
    }
}
