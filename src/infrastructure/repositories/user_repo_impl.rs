// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::user::User;
use crate::domain::repositories::roast_repository::RepositoryError;
use crate::domain::repositories::user_repository::UserRepository;
use crate::infrastructure::database::entities::{api_key, user};
use crate::infrastructure::repositories::map_unique_violation;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{sea_query::Expr, *};
use std::sync::Arc;
use uuid::Uuid;

/// 用户仓库实现
#[derive(Clone)]
pub struct UserRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl UserRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn update_flag(
        &self,
        id: Uuid,
        column: user::Column,
        value: bool,
    ) -> Result<(), RepositoryError> {
        let result = user::Entity::update_many()
            .col_expr(column, Expr::value(value))
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let model = user::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            is_pro: Set(user.is_pro),
            upgrade_banner_dismissed: Set(user.upgrade_banner_dismissed),
            created_at: Set(user.created_at.into()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "email is already registered"))?;
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let model = user::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn set_pro(&self, id: Uuid, is_pro: bool) -> Result<(), RepositoryError> {
        self.update_flag(id, user::Column::IsPro, is_pro).await
    }

    async fn dismiss_upgrade_banner(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.update_flag(id, user::Column::UpgradeBannerDismissed, true)
            .await
    }

    async fn create_api_key(&self, key: &str, user_id: Uuid) -> Result<(), RepositoryError> {
        let model = api_key::ActiveModel {
            key: Set(key.to_string()),
            user_id: Set(user_id),
            created_at: Set(Utc::now().into()),
        };
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "api key already exists"))?;
        Ok(())
    }

    async fn find_by_api_key(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        let Some(api_key) = api_key::Entity::find_by_id(key.to_string())
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };
        self.find_by_id(api_key.user_id).await
    }
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            is_pro: model.is_pro,
            upgrade_banner_dismissed: model.upgrade_banner_dismissed,
            created_at: model.created_at.into(),
        }
    }
}
