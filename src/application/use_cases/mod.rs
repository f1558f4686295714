// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 每个用例代表一个完整的业务流程，负责权限检查并编排领域服务
pub mod account_use_case;
pub mod payment_use_case;
pub mod roast_use_case;
