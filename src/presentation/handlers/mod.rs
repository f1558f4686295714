// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 处理器只负责解析请求和组装响应，业务规则在用例中
pub mod account_handler;
pub mod payment_handler;
pub mod roast_handler;
