// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - roast 仓库（roast_repository）：roast 记录及其条件状态更新
/// - 结果快照仓库（roast_result_repository）
/// - 分享链接仓库（share_link_repository）
/// - 用户仓库（user_repository）：用户与 API 密钥
/// - 购买记录仓库（purchase_repository）
/// - 存储仓库（storage_repository）：截图等对象存储
pub mod purchase_repository;
pub mod roast_repository;
pub mod roast_result_repository;
pub mod share_link_repository;
pub mod storage_repository;
pub mod user_repository;
