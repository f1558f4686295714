// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - roast：一次网址分析请求及其生命周期
/// - 分析结果（analysis）：规范化后的评分与反馈
/// - 抓取内容（scraped_content）：页面文本结构
/// - 分享链接、用户、购买记录
pub mod analysis;
pub mod purchase;
pub mod roast;
pub mod roast_result;
pub mod scraped_content;
pub mod share_link;
pub mod user;
