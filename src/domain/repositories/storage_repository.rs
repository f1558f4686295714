// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 存储仓库特质
///
/// 定义对象存储访问接口，截图以公开URL的形式对外提供
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// 使用指定键保存数据到存储中，同键覆盖
    async fn save(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// 根据键从存储中删除数据
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// 检查目标存储桶是否可用
    async fn bucket_exists(&self) -> Result<bool, StorageError>;

    /// 键对应的公开访问URL
    fn public_url(&self, key: &str) -> String;
}
