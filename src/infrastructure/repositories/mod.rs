// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的具体实现
/// 包括 sea-orm 数据库实现和内存实现
pub mod in_memory;
pub mod purchase_repo_impl;
pub mod roast_repo_impl;
pub mod roast_result_repo_impl;
pub mod share_link_repo_impl;
pub mod user_repo_impl;


use crate::domain::repositories::roast_repository::RepositoryError;
use sea_orm::{DbErr, SqlErr};

/// 将唯一约束冲突映射为 `Conflict`，其余错误保持为数据库错误
pub(crate) fn map_unique_violation(e: DbErr, message: &str) -> RepositoryError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RepositoryError::Conflict(message.to_string()),
        _ => RepositoryError::Database(e),
    }
}
