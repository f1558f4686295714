// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::repositories::storage_repository::StorageRepository;
use crate::engines::traits::{EngineError, PageRenderer};
use crate::utils::errors::RoastError;

/// 截图对象在存储桶中的路径
pub fn screenshot_key(roast_id: Uuid) -> String {
    format!("screenshots/{}.jpg", roast_id)
}

/// 截图服务
///
/// 调用渲染引擎获取页面图片并写入对象存储，返回公开URL。
/// 本层不做重试：渲染失败立即返回 `CaptureFailure`。
pub struct ScreenshotService {
    renderer: Arc<dyn PageRenderer>,
    storage: Arc<dyn StorageRepository>,
}

impl ScreenshotService {
    pub fn new(renderer: Arc<dyn PageRenderer>, storage: Arc<dyn StorageRepository>) -> Self {
        Self { renderer, storage }
    }

    /// 渲染引擎凭据是否已配置
    pub fn is_configured(&self) -> bool {
        self.renderer.is_configured()
    }

    /// 截图并上传
    ///
    /// # 错误
    /// * 存储桶不存在或不可访问时返回 `StorageUnavailable`
    /// * 渲染失败或返回空图片时返回 `CaptureFailure`，携带上游状态码和响应体
    #[instrument(skip(self))]
    pub async fn capture(&self, roast_id: Uuid, url: &str) -> Result<String, RoastError> {
        match self.storage.bucket_exists().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(RoastError::StorageUnavailable(
                    "screenshot bucket does not exist".to_string(),
                ))
            }
            Err(e) => return Err(RoastError::StorageUnavailable(e.to_string())),
        }

        let image = match self.renderer.render(url).await {
            Ok(image) => image,
            Err(e) => {
                counter!("screenshot_capture_total", "outcome" => "failed").increment(1);
                warn!("{} renderer failed for {}: {}", self.renderer.name(), url, e);
                return Err(capture_failure(e));
            }
        };

        let key = screenshot_key(roast_id);
        self.storage
            .save(&key, &image.bytes, &image.content_type)
            .await?;
        counter!("screenshot_capture_total", "outcome" => "success").increment(1);

        let public_url = self.storage.public_url(&key);
        info!("Stored screenshot for {} ({} bytes)", url, image.bytes.len());
        Ok(public_url)
    }

    /// 删除截图对象，对象不存在时视为成功
    pub async fn remove(&self, roast_id: Uuid) -> Result<(), RoastError> {
        self.storage.delete(&screenshot_key(roast_id)).await?;
        Ok(())
    }
}

fn capture_failure(err: EngineError) -> RoastError {
    RoastError::CaptureFailure {
        status: err.status(),
        message: err.to_string(),
    }
}
