// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 中间件模块
///
/// 认证中间件为每个请求解析调用者身份
pub mod auth_middleware;
