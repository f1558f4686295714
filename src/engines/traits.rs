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

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::models::scraped_content::ScrapedContent;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 上游返回非成功状态码
    #[error("Upstream returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// 网络错误、超时、429 和 5xx 可重试，其余 4xx 视为终止
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(is_retryable_status)
            }
            EngineError::HttpStatus { status, .. } => {
                reqwest::StatusCode::from_u16(*status).is_ok_and(is_retryable_status)
            }
            EngineError::Timeout => true,
            EngineError::Other(_) => false,
        }
    }

    /// 上游状态码（如果有）
    pub fn status(&self) -> Option<u16> {
        match self {
            EngineError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            EngineError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// 截图结果
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// 图片字节
    pub bytes: Bytes,
    /// 内容类型
    pub content_type: String,
}

/// 网页抓取特质
///
/// 抓取失败不返回错误，而是返回 `success == false` 的内容
#[async_trait]
pub trait WebsiteScraper: Send + Sync {
    /// 抓取并提取页面文本结构
    async fn scrape(&self, url: &str) -> ScrapedContent;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 页面渲染特质
///
/// 调用第三方渲染服务获取页面截图，本层不做重试
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// 渲染页面并返回图片
    async fn render(&self, url: &str) -> Result<CapturedImage, EngineError>;

    /// 必需的凭据是否已配置
    fn is_configured(&self) -> bool {
        true
    }

    /// 引擎名称
    fn name(&self) -> &'static str;
}
