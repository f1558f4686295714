// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;

use crate::domain::models::analysis::AnalysisResult;
use crate::domain::models::roast::{Roast, RoastStatus};

/// 客户端渲染状态
///
/// pending/processing 显示加载；failed 显示错误并允许重试；completed 显示结果。
/// 已完成但结果无法读取的记录仍按加载处理，避免闪现错误
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RoastView {
    Loading,
    Error {
        message: String,
        #[serde(rename = "canRetry")]
        can_retry: bool,
    },
    Result {
        score: u8,
        #[serde(rename = "screenshotUrl")]
        screenshot_url: Option<String>,
        result: AnalysisResult,
    },
}

impl RoastView {
    pub fn from_roast(roast: &Roast) -> Self {
        match roast.status {
            RoastStatus::Pending | RoastStatus::Processing => RoastView::Loading,
            RoastStatus::Failed => RoastView::Error {
                message: roast
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Analysis failed".to_string()),
                can_retry: true,
            },
            RoastStatus::Completed => match &roast.result {
                Some(result) => RoastView::Result {
                    score: result.overall_score,
                    screenshot_url: roast.screenshot_url.clone(),
                    result: result.clone(),
                },
                None => RoastView::Loading,
            },
        }
    }
}

/// 轮询接口的响应：记录本身加上派生的视图
#[derive(Debug, Serialize)]
pub struct RoastResponse {
    #[serde(flatten)]
    pub roast: Roast,
    pub view: RoastView,
}

impl From<Roast> for RoastResponse {
    fn from(roast: Roast) -> Self {
        let view = RoastView::from_roast(&roast);
        Self { roast, view }
    }
}
