// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集成测试模块
///
/// 逐个接口验证状态码和无副作用的失败路径
pub mod api_tests;
