// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 处理器只负责参数提取和响应封装，业务逻辑在用例层
pub mod analytics_handler;
pub mod crawl_handler;
pub mod target_handler;
