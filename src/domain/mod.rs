// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：roast、分析结果、用户等业务实体
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：截图、模型分析、分析编排和支付
///
/// 领域层不依赖于任何外部实现，具体实现由基础设施层提供。
pub mod models;
pub mod repositories;
pub mod services;
