// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::dto::account_request::SignupRequestDto;
use crate::application::use_cases::account_use_case::AccountUseCase;
use crate::domain::models::user::User;
use crate::presentation::errors::AppError;
use crate::presentation::extractors::current_user::CurrentUser;

/// 注册并返回 bearer 令牌
pub async fn signup(
    Extension(use_case): Extension<Arc<AccountUseCase>>,
    Json(payload): Json<SignupRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    let created = use_case.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn me(
    Extension(use_case): Extension<Arc<AccountUseCase>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(use_case.me(&user).await?))
}

/// 关闭升级提示
pub async fn dismiss_upgrade_banner(
    Extension(use_case): Extension<Arc<AccountUseCase>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(use_case.dismiss_banner(&user).await?))
}
