// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 爬取和情感分析两条流水线的工作器，以及它们的生命周期管理
pub mod crawl_worker;
pub mod manager;
pub mod sentiment_worker;
pub mod worker;

pub use worker::Worker;
