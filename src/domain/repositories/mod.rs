// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层的持久化契约，具体实现由基础设施层提供：
/// - 存储仓库（storage_repository）：键值形式的原始字节存储
/// - 目标仓库（target_repository）：采集目标列表
/// - 结果存储（result_store）：爬取批次与分类进度
pub mod result_store;
pub mod storage_repository;
pub mod target_repository;
