// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 分析服务（analysis_service）：把一条 roast 从 pending 推进到终态
/// - LLM服务（llm_service）：调用视觉模型并规范化输出
/// - 截图服务（screenshot_service）：渲染页面并写入对象存储
/// - 支付服务（payment_service）：支付网关抽象
pub mod analysis_service;
pub mod llm_service;
pub mod payment_service;
pub mod screenshot_service;
