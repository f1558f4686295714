// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// 当前结果结构版本
pub const ANALYSIS_RESULT_VERSION: u32 = 1;

/// 评估类别
///
/// 顺序固定，序列化时使用展示名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Hero Section")]
    HeroSection,
    #[serde(rename = "Trust & Social Proof")]
    TrustSocialProof,
    #[serde(rename = "Messaging Clarity")]
    MessagingClarity,
    #[serde(rename = "CTA Strategy")]
    CtaStrategy,
    #[serde(rename = "Visual Flow")]
    VisualFlow,
    #[serde(rename = "Web3 Relevance")]
    Web3Relevance,
}

impl Category {
    /// 所有类别，按固定顺序
    pub const ALL: [Category; 6] = [
        Category::HeroSection,
        Category::TrustSocialProof,
        Category::MessagingClarity,
        Category::CtaStrategy,
        Category::VisualFlow,
        Category::Web3Relevance,
    ];

    /// 展示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::HeroSection => "Hero Section",
            Category::TrustSocialProof => "Trust & Social Proof",
            Category::MessagingClarity => "Messaging Clarity",
            Category::CtaStrategy => "CTA Strategy",
            Category::VisualFlow => "Visual Flow",
            Category::Web3Relevance => "Web3 Relevance",
        }
    }

    /// 模型输出中对应的字段名
    pub fn payload_key(&self) -> &'static str {
        match self {
            Category::HeroSection => "heroSection",
            Category::TrustSocialProof => "trustSocialProof",
            Category::MessagingClarity => "messagingClarity",
            Category::CtaStrategy => "ctaStrategy",
            Category::VisualFlow => "visualFlow",
            Category::Web3Relevance => "web3Relevance",
        }
    }

    /// 按展示名称或字段名解析（忽略大小写）
    pub fn parse(name: &str) -> Option<Category> {
        let name = name.trim();
        Category::ALL.into_iter().find(|c| {
            c.display_name().eq_ignore_ascii_case(name) || c.payload_key().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// 根据类别得分推导严重程度
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=49 => Severity::High,
            50..=74 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" => Some(Severity::High),
            "medium" | "moderate" => Some(Severity::Medium),
            "low" | "minor" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// 单条反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub severity: Severity,
    pub feedback: String,
}

/// 改写建议
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteSuggestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta: Option<String>,
}

/// 规范化后的分析结果
///
/// `category_scores` 恰好包含六个类别，所有分数在 0..=100 之间；
/// `findings` 每个类别一条，按类别顺序排列。
/// `raw` 保留模型的原始输出，便于排查。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub version: u32,
    pub overall_score: u8,
    pub category_scores: BTreeMap<Category, u8>,
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub fixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_suggestion: Option<RewriteSuggestion>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

/// 模型输出结构错误
#[derive(Error, Debug, PartialEq)]
pub enum ResultShapeError {
    #[error("model output is not a JSON object")]
    NotAnObject,

    #[error("model output is missing required field `{0}`")]
    MissingField(String),

    #[error("field `{0}` is not a numeric score")]
    InvalidScore(String),

    #[error("model output has no score for category `{0}`")]
    MissingCategory(Category),
}

impl AnalysisResult {
    /// 将模型的原始 JSON 输出规范化
    ///
    /// 接受两种形式：
    /// 1. 六个类别对象（`heroSection` 等），每个包含 `score`/`severity`/`feedback`
    /// 2. `categoryScores` 映射加 `feedback` 数组
    ///
    /// 分数被四舍五入并截断到 0..=100；缺失或无法识别的严重程度按分数推导。
    pub fn from_llm_payload(raw: Value) -> Result<Self, ResultShapeError> {
        let obj = raw.as_object().ok_or(ResultShapeError::NotAnObject)?;

        let overall_score = obj
            .get("overallScore")
            .ok_or_else(|| ResultShapeError::MissingField("overallScore".to_string()))
            .and_then(|v| parse_score(v, "overallScore"))?;

        let has_category_objects = Category::ALL
            .iter()
            .all(|c| obj.get(c.payload_key()).is_some_and(Value::is_object));

        let (category_scores, findings) = if has_category_objects {
            from_category_objects(obj)?
        } else {
            from_score_map(obj)?
        };

        let fixes = obj
            .get("fixes")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.trim().to_string()),
                        Value::Object(o) => o
                            .get("fix")
                            .or_else(|| o.get("description"))
                            .and_then(Value::as_str)
                            .map(|s| s.trim().to_string()),
                        _ => None,
                    })
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let rewrite_suggestion = obj
            .get("rewriteSuggestion")
            .or_else(|| obj.get("rewrite"))
            .and_then(Value::as_object)
            .map(|o| RewriteSuggestion {
                headline: string_field(o, "headline"),
                subheadline: string_field(o, "subheadline"),
                cta: string_field(o, "cta"),
            })
            .filter(|r| r.headline.is_some() || r.subheadline.is_some() || r.cta.is_some());

        Ok(Self {
            version: ANALYSIS_RESULT_VERSION,
            overall_score,
            category_scores,
            findings,
            fixes,
            rewrite_suggestion,
            raw,
        })
    }

    /// 检查结果是否满足结构约束
    ///
    /// 六个类别都有分数，且 `findings` 与类别一一对应、顺序一致
    pub fn is_consistent(&self) -> bool {
        self.overall_score <= 100
            && self.category_scores.len() == Category::ALL.len()
            && self.findings.len() == Category::ALL.len()
            && Category::ALL
                .iter()
                .zip(&self.findings)
                .all(|(c, f)| {
                    f.category == *c && self.category_scores.get(c).is_some_and(|s| *s <= 100)
                })
    }

    /// 指定类别的反馈
    pub fn finding(&self, category: Category) -> Option<&Finding> {
        self.findings.iter().find(|f| f.category == category)
    }
}

type Normalized = (BTreeMap<Category, u8>, Vec<Finding>);

fn from_category_objects(obj: &Map<String, Value>) -> Result<Normalized, ResultShapeError> {
    let mut scores = BTreeMap::new();
    let mut findings = Vec::new();

    for category in Category::ALL {
        let key = category.payload_key();
        let section = obj
            .get(key)
            .and_then(Value::as_object)
            .ok_or(ResultShapeError::MissingCategory(category))?;

        let score = section
            .get("score")
            .ok_or_else(|| ResultShapeError::MissingField(format!("{}.score", key)))
            .and_then(|v| parse_score(v, &format!("{}.score", key)))?;
        scores.insert(category, score);

        let severity = section
            .get("severity")
            .and_then(Value::as_str)
            .and_then(Severity::parse)
            .unwrap_or_else(|| Severity::from_score(score));
        let feedback = section
            .get("feedback")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        findings.push(Finding {
            category,
            severity,
            feedback,
        });
    }

    Ok((scores, findings))
}

fn from_score_map(obj: &Map<String, Value>) -> Result<Normalized, ResultShapeError> {
    let score_map = obj
        .get("categoryScores")
        .and_then(Value::as_object)
        .ok_or_else(|| ResultShapeError::MissingField("categoryScores".to_string()))?;
    let feedback = obj
        .get("feedback")
        .and_then(Value::as_array)
        .ok_or_else(|| ResultShapeError::MissingField("feedback".to_string()))?;

    let mut scores = BTreeMap::new();
    for (name, value) in score_map {
        if let Some(category) = Category::parse(name) {
            scores.insert(category, parse_score(value, name)?);
        }
    }
    if let Some(missing) = Category::ALL.into_iter().find(|c| !scores.contains_key(c)) {
        return Err(ResultShapeError::MissingCategory(missing));
    }

    // 每个类别取第一条反馈，缺失的类别使用空反馈
    let findings = Category::ALL
        .into_iter()
        .map(|category| {
            let item = feedback
                .iter()
                .filter_map(Value::as_object)
                .find(|item| {
                    item.get("category")
                        .and_then(Value::as_str)
                        .and_then(Category::parse)
                        == Some(category)
                });
            let severity = item
                .and_then(|i| i.get("severity"))
                .and_then(Value::as_str)
                .and_then(Severity::parse)
                .unwrap_or_else(|| Severity::from_score(scores[&category]));
            let text = item
                .and_then(|i| i.get("feedback").or_else(|| i.get("message")))
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            Finding {
                category,
                severity,
                feedback: text,
            }
        })
        .collect();

    Ok((scores, findings))
}

fn parse_score(value: &Value, field: &str) -> Result<u8, ResultShapeError> {
    let n = value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ResultShapeError::InvalidScore(field.to_string()))?;
    Ok(n.round().clamp(0.0, 100.0) as u8)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
