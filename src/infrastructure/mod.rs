// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 依赖领域层的抽象接口，提供具体技术实现：
/// - 指标（metrics）：Prometheus 导出
/// - 仓库实现（repositories）：目标仓库与结果存储
/// - 存储（storage）：本地文件与内存存储
pub mod metrics;
pub mod repositories;
pub mod storage;
