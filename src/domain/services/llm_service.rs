// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::settings::LlmSettings;
use crate::domain::models::analysis::{AnalysisResult, Category};
use crate::domain::models::scraped_content::ScrapedContent;
use crate::engines::traits::EngineError;
use crate::utils::errors::RoastError;
use crate::utils::retry_policy::RetryPolicy;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// 落地页评审接口
#[async_trait]
pub trait LLMServiceTrait: Send + Sync {
    /// 根据截图和页面内容生成结构化评审
    async fn analyze(
        &self,
        url: &str,
        screenshot_url: &str,
        content: Option<&ScrapedContent>,
    ) -> Result<(AnalysisResult, TokenUsage), RoastError>;

    /// API 密钥是否已配置
    fn is_configured(&self) -> bool;
}

const SYSTEM_PROMPT: &str = r#"You are a senior conversion-rate and UX reviewer who specialises in Web3 landing pages (DeFi, NFT, L1/L2, wallets, DAOs).
You receive a screenshot of the above-the-fold area of a landing page and, when available, the text scraped from that page.
Be direct and specific. Reference what is actually visible. No generic advice.

Respond with ONLY a JSON object, no markdown, using exactly this schema:
{
  "overallScore": <integer 0-100>,
  "heroSection": {"score": <integer 0-100>, "severity": "high" | "medium" | "low", "feedback": "<2-3 sentences>"},
  "trustSocialProof": {"score": <integer 0-100>, "severity": "high" | "medium" | "low", "feedback": "<2-3 sentences>"},
  "messagingClarity": {"score": <integer 0-100>, "severity": "high" | "medium" | "low", "feedback": "<2-3 sentences>"},
  "ctaStrategy": {"score": <integer 0-100>, "severity": "high" | "medium" | "low", "feedback": "<2-3 sentences>"},
  "visualFlow": {"score": <integer 0-100>, "severity": "high" | "medium" | "low", "feedback": "<2-3 sentences>"},
  "web3Relevance": {"score": <integer 0-100>, "severity": "high" | "medium" | "low", "feedback": "<2-3 sentences>"},
  "fixes": ["<concrete fix>", "..."],
  "rewriteSuggestion": {"headline": "<string>", "subheadline": "<string>", "cta": "<string>"}
}

Severity is "high" for scores below 50, "medium" for 50-74 and "low" otherwise.
List the 3 to 5 most impactful fixes first. The rewrite suggestion is optional."#;

/// LLM服务 - 通过 OpenAI 兼容的 chat completions 接口评审落地页
///
/// 截图以图片输入传入，抓取到的页面文本附加在用户消息中。
/// 网络错误、超时、429 和 5xx 按配置的固定间隔重试，其余错误立即失败。
pub struct LLMService {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base_url: String,
    temperature: f32,
    max_tokens: u32,
    retry_policy: RetryPolicy,
}

#[async_trait]
impl LLMServiceTrait for LLMService {
    async fn analyze(
        &self,
        url: &str,
        screenshot_url: &str,
        content: Option<&ScrapedContent>,
    ) -> Result<(AnalysisResult, TokenUsage), RoastError> {
        LLMService::analyze(self, url, screenshot_url, content).await
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl LLMService {
    pub fn new(settings: &LlmSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            retry_policy: settings.retry_policy(),
        })
    }

    /// 评审落地页
    ///
    /// # 参数
    /// * `url` - 目标网站
    /// * `screenshot_url` - 截图的公开URL
    /// * `content` - 抓取到的页面内容，抓取失败时不附加
    ///
    /// # 错误
    /// * 未配置 API 密钥时返回 `Configuration`
    /// * 请求在重试后仍失败、输出无法解析或结构不完整时返回 `AnalysisFailure`
    #[instrument(skip(self, content))]
    pub async fn analyze(
        &self,
        url: &str,
        screenshot_url: &str,
        content: Option<&ScrapedContent>,
    ) -> Result<(AnalysisResult, TokenUsage), RoastError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RoastError::Configuration("LLM API key not configured".to_string()))?;

        let request_body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": build_user_prompt(url, content) },
                        { "type": "image_url", "image_url": { "url": screenshot_url } }
                    ]
                }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" }
        });

        let body = self
            .retry_policy
            .execute("LLM request", EngineError::is_retryable, |_| {
                self.request_completion(api_key, &request_body)
            })
            .await
            .map_err(|e| RoastError::AnalysisFailure(format!("LLM request failed: {}", e)))?;

        let (payload, usage) = parse_completion(&body)?;
        let result = AnalysisResult::from_llm_payload(payload)?;

        debug!(
            "LLM scored {} at {} ({} tokens)",
            url, result.overall_score, usage.total_tokens
        );
        Ok((result, usage))
    }

    async fn request_completion(&self, api_key: &str, body: &Value) -> Result<Value, EngineError> {
        counter!("llm_request_attempts_total").increment(1);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base_url))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::HttpStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        Ok(response.json().await?)
    }
}

/// 构建用户消息文本
///
/// 抓取成功时附加页面内容
pub fn build_user_prompt(url: &str, content: Option<&ScrapedContent>) -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| c.display_name())
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "Roast this landing page: {}\nScore each category ({}) and the page overall.",
        url, categories
    );

    if let Some(content) = content.filter(|c| c.success) {
        prompt.push_str("\n\nScraped page content:\n");
        prompt.push_str(&content.to_prompt_context());
    }

    prompt
}

/// 去除可选的 markdown 代码块包裹
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 跳过语言标记，例如 ```json
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().trim_end_matches("```").trim()
}

fn parse_completion(body: &Value) -> Result<(Value, TokenUsage), RoastError> {
    let usage = body
        .get("usage")
        .map(|u| TokenUsage {
            prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: u["total_tokens"].as_u64().unwrap_or(0) as u32,
        })
        .unwrap_or_default();

    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            RoastError::AnalysisFailure("Invalid response format from LLM API".to_string())
        })?;

    let payload = serde_json::from_str::<Value>(strip_code_fences(content)).map_err(|e| {
        RoastError::AnalysisFailure(format!("Failed to parse LLM output as JSON: {}", e))
    })?;

    Ok((payload, usage))
}

#[cfg(test)]
#[path = "llm_service_test.rs"]
mod tests;
