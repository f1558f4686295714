// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::purchase::{Purchase, PurchaseStatus};
use crate::domain::repositories::purchase_repository::PurchaseRepository;
use crate::domain::repositories::roast_repository::RepositoryError;
use crate::infrastructure::database::entities::purchase;
use crate::infrastructure::repositories::map_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{sea_query::Expr, *};
use std::sync::Arc;
use uuid::Uuid;

/// 购买记录仓库实现
#[derive(Clone)]
pub struct PurchaseRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl PurchaseRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PurchaseRepository for PurchaseRepositoryImpl {
    async fn create(&self, purchase: &Purchase) -> Result<Purchase, RepositoryError> {
        let model = purchase::ActiveModel {
            id: Set(purchase.id),
            user_id: Set(purchase.user_id),
            roast_id: Set(purchase.roast_id),
            provider_session_id: Set(purchase.provider_session_id.clone()),
            status: Set(purchase.status.to_string()),
            amount_cents: Set(purchase.amount_cents),
            currency: Set(purchase.currency.clone()),
            created_at: Set(purchase.created_at.into()),
            completed_at: Set(purchase.completed_at.map(Into::into)),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "checkout session already recorded"))?;
        Ok(purchase.clone())
    }

    async fn find_by_provider_session(
        &self,
        provider_session_id: &str,
    ) -> Result<Option<Purchase>, RepositoryError> {
        purchase::Entity::find()
            .filter(purchase::Column::ProviderSessionId.eq(provider_session_id))
            .one(self.db.as_ref())
            .await?
            .map(Purchase::try_from)
            .transpose()
    }

    async fn mark_completed(
        &self,
        provider_session_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let completed_at: DateTime<FixedOffset> = completed_at.into();
        let result = purchase::Entity::update_many()
            .col_expr(
                purchase::Column::Status,
                Expr::value(PurchaseStatus::Completed.to_string()),
            )
            .col_expr(purchase::Column::CompletedAt, Expr::value(completed_at))
            .filter(purchase::Column::ProviderSessionId.eq(provider_session_id))
            .filter(purchase::Column::Status.eq(PurchaseStatus::Pending.to_string()))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Purchase>, RepositoryError> {
        purchase::Entity::find()
            .filter(purchase::Column::UserId.eq(user_id))
            .order_by_desc(purchase::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Purchase::try_from)
            .collect()
    }
}

impl TryFrom<purchase::Model> for Purchase {
    type Error = RepositoryError;

    fn try_from(model: purchase::Model) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse::<PurchaseStatus>()
            .map_err(|e| RepositoryError::InvalidRecord(format!("purchase {}: {}", model.id, e)))?;

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            roast_id: model.roast_id,
            provider_session_id: model.provider_session_id,
            status,
            amount_cents: model.amount_cents,
            currency: model.currency,
            created_at: model.created_at.into(),
            completed_at: model.completed_at.map(Into::into),
        })
    }
}
