// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 端到端测试模块
///
/// 模拟真实用户场景：匿名试用、注册、认领、分享、升级
pub mod roast_journey_test;
