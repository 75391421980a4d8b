// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 文本清理工具
//!
//! 搜索接口返回的标题带有 `<em class="keyword">` 高亮标签，
//! 入库前需要去掉

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Failed to compile html tag regex"));

/// 去掉 HTML 标签并还原常见实体
pub fn strip_html_tags(input: &str) -> String {
    let stripped = HTML_TAG.replace_all(input, "");
    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

/// 截断到指定字符数，用于日志
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}
