// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 最多保留的副标题数
pub const MAX_SUB_HEADLINES: usize = 5;
/// 最多保留的行动号召文本数
pub const MAX_CTA_TEXTS: usize = 10;
/// 可见正文的最大字符数
pub const MAX_VISIBLE_TEXT_CHARS: usize = 3000;

/// 抓取到的页面文本结构
///
/// `success` 为 false 时其余字段均为空，流程不会因此中断
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedContent {
    /// 是否抓取成功
    pub success: bool,
    /// `<title>` 文本
    pub title: String,
    /// meta description
    pub meta_description: String,
    /// 第一个 `<h1>`
    pub main_headline: String,
    /// `<h2>`/`<h3>` 文本
    pub sub_headlines: Vec<String>,
    /// 按钮与链接上的行动号召文本
    pub cta_texts: Vec<String>,
    /// 去除脚本样式后的可见正文
    pub visible_text: String,
}

impl ScrapedContent {
    /// 抓取失败时的占位内容
    pub fn failed() -> Self {
        Self::default()
    }

    /// 渲染为提示词中的页面内容段落
    pub fn to_prompt_context(&self) -> String {
        let or_none = |s: &str| if s.is_empty() { "(none)".to_string() } else { s.to_string() };
        let list = |items: &[String]| {
            if items.is_empty() {
                "(none)".to_string()
            } else {
                items.join(" | ")
            }
        };

        format!(
            "Title: {}\nMeta description: {}\nHeadline (H1): {}\nSub-headlines: {}\nCTA texts: {}\nVisible text:\n{}",
            or_none(&self.title),
            or_none(&self.meta_description),
            or_none(&self.main_headline),
            list(&self.sub_headlines),
            list(&self.cta_texts),
            or_none(&self.visible_text),
        )
    }
}
