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

use crate::config::settings::ScraperSettings;
use crate::domain::models::scraped_content::{
    ScrapedContent, MAX_CTA_TEXTS, MAX_SUB_HEADLINES, MAX_VISIBLE_TEXT_CHARS,
};
use crate::engines::traits::{EngineError, WebsiteScraper};
use crate::engines::validators;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, instrument, warn};

static NON_VISIBLE_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>|<svg\b[^>]*>.*?</svg\s*>|<template\b[^>]*>.*?</template\s*>",
    )
    .expect("Failed to compile non-visible block regex")
});
static TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("Failed to compile title regex")
});
static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("Failed to compile meta regex"));
static META_DESCRIPTION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bname\s*=\s*["']?description["'\s/>]"#)
        .expect("Failed to compile meta name regex")
});
static CONTENT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("Failed to compile content attribute regex")
});
static H1: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").expect("Failed to compile h1 regex")
});
static H2_H3: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h[23]\b[^>]*>(.*?)</h[23]\s*>").expect("Failed to compile h2/h3 regex")
});
static CTA_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(button|a)\b([^>]*)>(.*?)</(?:button|a)\s*>")
        .expect("Failed to compile CTA regex")
});
static CTA_STYLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:class|role|id)\s*=\s*["'][^"']*\b(?:btn|button|cta)"#)
        .expect("Failed to compile CTA style regex")
});
static BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("Failed to compile body regex")
});
static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("Failed to compile HTML clean regex"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// CTA 文本的最大长度，过长的链接文本通常不是按钮
const MAX_CTA_LEN: usize = 60;

/// 网页抓取引擎
///
/// 基于 reqwest 获取原始 HTML，用正则提取标题、描述、标题层级和 CTA 文本。
/// 网络错误或非成功状态按重试策略重试，全部失败后返回 `success == false` 的内容。
pub struct HttpScraper {
    client: reqwest::Client,
    retry_policy: RetryPolicy,
    allow_private_hosts: bool,
}

impl HttpScraper {
    /// 根据配置创建抓取引擎
    pub fn new(settings: &ScraperSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            retry_policy: settings.retry_policy(),
            allow_private_hosts: settings.allow_private_hosts,
        })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, EngineError> {
        counter!("scrape_attempts_total").increment(1);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl WebsiteScraper for HttpScraper {
    #[instrument(skip(self))]
    async fn scrape(&self, url: &str) -> ScrapedContent {
        if !self.allow_private_hosts {
            if let Err(e) = validators::validate_resolved_host(url).await {
                warn!("Refusing to scrape {}: {}", url, e);
                return ScrapedContent::failed();
            }
        }

        // 抓取阶段所有错误都允许重试
        let fetched = self
            .retry_policy
            .execute("scrape", |_: &EngineError| true, |_| self.fetch_html(url))
            .await;

        match fetched {
            Ok(html) => {
                let content = extract_content(&html);
                debug!(
                    "Scraped {}: title={:?}, {} sub-headlines, {} CTAs",
                    url,
                    content.title,
                    content.sub_headlines.len(),
                    content.cta_texts.len()
                );
                content
            }
            Err(e) => {
                warn!("Scraping {} failed, continuing without page content: {}", url, e);
                ScrapedContent::failed()
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// 从原始 HTML 中提取页面文本结构
///
/// 任何字段缺失都只会得到空值
pub fn extract_content(html: &str) -> ScrapedContent {
    let cleaned = NON_VISIBLE_BLOCKS.replace_all(html, " ");

    let title = TITLE
        .captures(&cleaned)
        .map(|c| clean_text(&c[1]))
        .unwrap_or_default();

    let meta_description = META_TAG
        .find_iter(html)
        .map(|m| m.as_str())
        .find(|tag| META_DESCRIPTION_NAME.is_match(tag))
        .and_then(|tag| CONTENT_ATTR.captures(tag))
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| clean_text(m.as_str()))
        .unwrap_or_default();

    let main_headline = H1
        .captures(&cleaned)
        .map(|c| clean_text(&c[1]))
        .unwrap_or_default();

    let sub_headlines = collect_unique(
        H2_H3.captures_iter(&cleaned).map(|c| clean_text(&c[1])),
        MAX_SUB_HEADLINES,
    );

    let cta_texts = collect_unique(
        CTA_ELEMENT.captures_iter(&cleaned).filter_map(|c| {
            let is_button = c[1].eq_ignore_ascii_case("button");
            if !is_button && !CTA_STYLED.is_match(&c[2]) {
                return None;
            }
            let text = clean_text(&c[3]);
            (text.chars().count() <= MAX_CTA_LEN).then_some(text)
        }),
        MAX_CTA_TEXTS,
    );

    let body = BODY
        .captures(&cleaned)
        .map(|c| c.get(1).map_or("", |m| m.as_str()).to_string())
        .unwrap_or_else(|| cleaned.to_string());
    let visible_text: String = clean_text(&body)
        .chars()
        .take(MAX_VISIBLE_TEXT_CHARS)
        .collect();

    ScrapedContent {
        success: true,
        title,
        meta_description,
        main_headline,
        sub_headlines,
        cta_texts,
        visible_text,
    }
}

/// 去除标签、解码实体并折叠空白
fn clean_text(fragment: &str) -> String {
    let without_tags = TAG.replace_all(fragment, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

fn collect_unique(items: impl Iterator<Item = String>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if out.len() >= limit {
            break;
        }
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
#[path = "scraper_engine_test.rs"]
mod tests;
