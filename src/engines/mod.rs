// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 外部协作方客户端
///
/// - B站搜索与评论接口（bilibili）
/// - 百度情感倾向分析接口（baidu_nlp）
pub mod baidu_nlp;
pub mod bilibili;
pub mod traits;
