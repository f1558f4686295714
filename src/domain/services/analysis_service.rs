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

use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::analysis::AnalysisResult;
use crate::domain::models::roast::Roast;
use crate::domain::models::roast_result::RoastResultRecord;
use crate::domain::repositories::roast_repository::{RepositoryError, RoastRepository};
use crate::domain::repositories::roast_result_repository::RoastResultRepository;
use crate::domain::services::llm_service::LLMServiceTrait;
use crate::domain::services::screenshot_service::ScreenshotService;
use crate::engines::traits::WebsiteScraper;
use crate::utils::errors::RoastError;

/// 分析编排服务
///
/// 每次调用 `run` 把一条 roast 从 pending 推进到终态：
///
/// ```text
/// pending --start--> processing --capture+analyze--> completed
///                               --any step fails---> failed
/// ```
///
/// 截图失败和模型失败会终止运行并记录到行上；抓取失败只降级为无页面文本。
pub struct AnalysisService {
    roast_repo: Arc<dyn RoastRepository>,
    result_repo: Arc<dyn RoastResultRepository>,
    screenshots: Arc<ScreenshotService>,
    scraper: Arc<dyn WebsiteScraper>,
    llm: Arc<dyn LLMServiceTrait>,
}

struct PipelineOutput {
    screenshot_url: String,
    result: AnalysisResult,
}

impl AnalysisService {
    pub fn new(
        roast_repo: Arc<dyn RoastRepository>,
        result_repo: Arc<dyn RoastResultRepository>,
        screenshots: Arc<ScreenshotService>,
        scraper: Arc<dyn WebsiteScraper>,
        llm: Arc<dyn LLMServiceTrait>,
    ) -> Self {
        Self {
            roast_repo,
            result_repo,
            screenshots,
            scraper,
            llm,
        }
    }

    /// 外部依赖是否都已配置
    ///
    /// 缺少截图或模型密钥时返回 `Configuration`，此时不会修改任何记录
    pub fn ensure_configured(&self) -> Result<(), RoastError> {
        if !self.screenshots.is_configured() {
            return Err(RoastError::Configuration(
                "Screenshot API key not configured".to_string(),
            ));
        }
        if !self.llm.is_configured() {
            return Err(RoastError::Configuration(
                "LLM API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// 执行一次完整分析
    ///
    /// # 返回值
    ///
    /// * `Ok(Roast)` - 已完成的记录
    /// * `Err(RoastError)` - 配置错误、记录不存在、状态冲突，或导致记录失败的原因
    #[instrument(skip(self))]
    pub async fn run(&self, id: Uuid) -> Result<Roast, RoastError> {
        self.ensure_configured()?;

        // 条件更新 pending → processing，并发触发只有一个能成功
        let started = self.roast_repo.start_processing(id).await.map_err(|e| match e {
            RepositoryError::NotFound => RoastError::NotFound(format!("Roast {}", id)),
            RepositoryError::Conflict(msg) => RoastError::Conflict(msg),
            other => RoastError::Repository(other),
        })?;

        info!("Analyzing {} (attempt {})", started.url, started.attempt_count);
        let timer = Instant::now();

        let outcome = match self.execute_pipeline(&started).await {
            Ok(output) => self.finish(started, output).await,
            Err(e) => Err(e),
        };

        histogram!("roast_analysis_duration_seconds").record(timer.elapsed().as_secs_f64());

        match outcome {
            Ok(completed) => {
                counter!("roast_analysis_total", "outcome" => "completed").increment(1);
                info!(
                    "Roast {} completed with score {}",
                    completed.id,
                    completed.score.unwrap_or_default()
                );
                Ok(completed)
            }
            Err(e) => {
                counter!("roast_analysis_total", "outcome" => "failed").increment(1);
                error!("Roast {} failed: {}", id, e);
                self.record_failure(id, &e).await;
                Err(e)
            }
        }
    }

    async fn execute_pipeline(&self, roast: &Roast) -> Result<PipelineOutput, RoastError> {
        let screenshot_url = self.screenshots.capture(roast.id, &roast.url).await?;
        self.roast_repo
            .set_screenshot_url(roast.id, &screenshot_url)
            .await?;

        let content = self.scraper.scrape(&roast.url).await;
        if !content.success {
            warn!(
                "No page content for {}, analyzing screenshot only",
                roast.url
            );
        }

        let (result, usage) = self
            .llm
            .analyze(&roast.url, &screenshot_url, Some(&content))
            .await?;
        info!(
            "LLM usage for {}: {} prompt + {} completion tokens",
            roast.id, usage.prompt_tokens, usage.completion_tokens
        );

        if !result.is_consistent() {
            return Err(RoastError::AnalysisFailure(
                "normalized result is inconsistent".to_string(),
            ));
        }

        Ok(PipelineOutput {
            screenshot_url,
            result,
        })
    }

    async fn finish(&self, started: Roast, output: PipelineOutput) -> Result<Roast, RoastError> {
        let completed = started.complete(output.screenshot_url, output.result)?;
        let completed = self.roast_repo.update(&completed).await?;

        // 完成状态已提交；快照缺失时分享读取回退到 roast 行
        if let Some(record) = RoastResultRecord::from_completed(&completed) {
            if let Err(e) = self.result_repo.upsert(&record).await {
                warn!(
                    "Roast {} completed but its result snapshot was not written: {}",
                    completed.id, e
                );
            }
        }
        Ok(completed)
    }

    /// 记录失败原因，保留已提交的部分字段（例如截图URL）
    async fn record_failure(&self, id: Uuid, err: &RoastError) {
        let current = match self.roast_repo.find_by_id(id).await {
            Ok(Some(roast)) => roast,
            Ok(None) => return,
            Err(e) => {
                error!("Failed to load roast {} to record failure: {}", id, e);
                return;
            }
        };

        match current.fail(err.to_string()) {
            Ok(failed) => {
                if let Err(e) = self.roast_repo.update(&failed).await {
                    error!("Failed to record failure for roast {}: {}", id, e);
                }
            }
            Err(e) => warn!("Roast {} not marked failed: {}", id, e),
        }
    }
}

#[cfg(test)]
#[path = "analysis_service_test.rs"]
pub(crate) mod tests;
