// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::application::dto::account_request::{SignupRequestDto, SignupResponseDto};
use crate::domain::models::user::{generate_api_key, User, API_KEY_PREFIX};
use crate::domain::repositories::roast_repository::RepositoryError;
use crate::domain::repositories::user_repository::UserRepository;
use crate::utils::errors::RoastError;

/// 账户用例
///
/// 注册、令牌认证以及用户偏好
pub struct AccountUseCase {
    user_repo: Arc<dyn UserRepository>,
}

impl AccountUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// 注册新用户并签发 API 密钥
    pub async fn signup(&self, dto: SignupRequestDto) -> Result<SignupResponseDto, RoastError> {
        dto.validate()
            .map_err(|e| RoastError::Validation(e.to_string()))?;

        let user = User::new(dto.email);
        let user = self.user_repo.create(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                RoastError::Conflict(format!("{} is already registered", user.email))
            }
            other => other.into(),
        })?;

        let token = generate_api_key();
        self.user_repo.create_api_key(&token, user.id).await?;
        info!("Registered user {}", user.id);

        Ok(SignupResponseDto { user, token })
    }

    /// 根据 bearer 令牌解析用户，格式不对或未登记时返回 `None`
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, RoastError> {
        let token = token.trim();
        if !token.starts_with(API_KEY_PREFIX) {
            return Ok(None);
        }
        Ok(self.user_repo.find_by_api_key(token).await?)
    }

    /// 重新读取用户，以拿到最新的 Pro 状态
    pub async fn me(&self, user: &User) -> Result<User, RoastError> {
        self.user_repo
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| RoastError::NotFound(format!("User {}", user.id)))
    }

    /// 关闭升级提示
    pub async fn dismiss_banner(&self, user: &User) -> Result<User, RoastError> {
        self.user_repo
            .dismiss_upgrade_banner(user.id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => RoastError::NotFound(format!("User {}", user.id)),
                other => other.into(),
            })?;
        self.me(user).await
    }
}
