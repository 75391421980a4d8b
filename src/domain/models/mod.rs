// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 采集目标（target）：关键字组及其调度配置
/// - 爬取任务（crawl_job）：目标在入队时刻的快照及其状态
/// - 采集记录（record）：候选内容源、分页游标和原始评论
/// - 情感分析（sentiment）：分类标签、存储批次和批次状态
pub mod crawl_job;
pub mod record;
pub mod sentiment;
pub mod target;
