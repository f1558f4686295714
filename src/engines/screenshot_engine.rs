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

use crate::config::settings::ScreenshotSettings;
use crate::engines::traits::{CapturedImage, EngineError, PageRenderer};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// 错误信息中保留的上游响应体长度
const MAX_ERROR_BODY: usize = 500;

/// 截图渲染引擎
///
/// 调用 ScreenshotOne 风格的渲染 API（`GET {base}/take`），
/// 固定视口尺寸，输出 JPEG
pub struct ScreenshotApiRenderer {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    width: u32,
    height: u32,
    quality: u8,
}

impl ScreenshotApiRenderer {
    /// 根据配置创建渲染引擎
    pub fn new(settings: &ScreenshotSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            width: settings.width,
            height: settings.height,
            quality: settings.quality,
        })
    }
}

#[async_trait]
impl PageRenderer for ScreenshotApiRenderer {
    #[instrument(skip(self))]
    async fn render(&self, url: &str) -> Result<CapturedImage, EngineError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EngineError::Other("screenshot API key is not configured".to_string()))?;

        let width = self.width.to_string();
        let height = self.height.to_string();
        let quality = self.quality.to_string();

        let start = Instant::now();
        let response = self
            .client
            .get(format!("{}/take", self.base_url))
            .query(&[
                ("access_key", api_key),
                ("url", url),
                ("viewport_width", width.as_str()),
                ("viewport_height", height.as_str()),
                ("format", "jpg"),
                ("image_quality", quality.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(EngineError::Other(
                "rendering API returned an empty image".to_string(),
            ));
        }

        debug!(
            "Rendered {} ({} bytes) in {}ms",
            url,
            bytes.len(),
            start.elapsed().as_millis()
        );

        Ok(CapturedImage {
            bytes,
            content_type,
        })
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &'static str {
        "screenshot-api"
    }
}
