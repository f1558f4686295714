// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::AnalysisResult;
use super::roast::Roast;

/// 已完成 roast 的结果快照
///
/// 在 roast 完成时与主记录一起写入，用于排行与统计查询
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoastResultRecord {
    pub roast_id: Uuid,
    pub url: String,
    pub screenshot_url: String,
    pub score: u8,
    pub result: AnalysisResult,
    pub created_at: DateTime<Utc>,
}

impl RoastResultRecord {
    /// 从已完成的 roast 生成快照，未完成时返回 None
    pub fn from_completed(roast: &Roast) -> Option<Self> {
        let result = roast.result.clone()?;
        Some(Self {
            roast_id: roast.id,
            url: roast.url.clone(),
            screenshot_url: roast.screenshot_url.clone()?,
            score: result.overall_score,
            result,
            created_at: roast.completed_at.unwrap_or(roast.updated_at),
        })
    }
}
