// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 配额分配（quota_allocator）：把请求总量分到各个关键字
/// - 候选排序（candidate_ranker）：按热度挑选内容源
/// - 分页引擎（pagination）：单个内容源的游标翻页
/// - 爬取执行（crawl_executor）：一次爬取任务的完整流程
/// - 目标注册表（target_registry）：采集目标的唯一写入口
pub mod candidate_ranker;
pub mod crawl_executor;
pub mod pagination;
pub mod quota_allocator;
pub mod target_registry;
