// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BilibiliSettings;
use crate::domain::models::record::{
    AuthorInfo, CandidateSource, CommentPage, RawRecord, PLATFORM_BILIBILI,
};
use crate::engines::traits::{CommentFetcher, SourceSearcher};
use crate::utils::errors::CollectorError;
use crate::utils::text_processing::{strip_html_tags, truncate_chars};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const SEARCH_PATH: &str = "/x/web-interface/wbi/search/type";
const REPLY_PATH: &str = "/x/v2/reply/main";
const SEARCH_PAGE_SIZE: &str = "50";

/// 接口返回的外层结构
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    result: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    id: u64,
    #[serde(default)]
    bvid: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    play: Value,
    #[serde(default)]
    review: Value,
}

#[derive(Debug, Deserialize)]
struct ReplyData {
    #[serde(default)]
    replies: Option<Vec<Value>>,
    #[serde(default)]
    cursor: Option<ReplyCursor>,
}

#[derive(Debug, Deserialize)]
struct ReplyCursor {
    #[serde(default)]
    is_end: bool,
    #[serde(default)]
    pagination_reply: Option<PaginationReply>,
}

#[derive(Debug, Deserialize)]
struct PaginationReply {
    #[serde(default)]
    next_offset: Option<String>,
}

/// B站客户端
///
/// 同时实现视频搜索和评论分页拉取
pub struct BilibiliClient {
    client: Client,
    base_url: Url,
}

impl BilibiliClient {
    pub fn new(settings: &BilibiliSettings) -> Result<Self, CollectorError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_static("https://www.bilibili.com/"),
        );
        headers.insert(
            header::ORIGIN,
            header::HeaderValue::from_static("https://www.bilibili.com"),
        );
        if let Some(cookie) = &settings.cookie {
            let value = header::HeaderValue::from_str(cookie)
                .map_err(|e| CollectorError::FatalCollaborator(format!("invalid cookie: {}", e)))?;
            headers.insert(header::COOKIE, value);
        }

        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            CollectorError::FatalCollaborator(format!("invalid base url {}: {}", settings.base_url, e))
        })?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CollectorError> {
        self.base_url
            .join(path)
            .map_err(|e| CollectorError::FatalCollaborator(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CollectorError> {
        let response = self.client.get(self.endpoint(path)?).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if let Some(err) = classify_status(status, &body) {
            return Err(err);
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            CollectorError::ProtocolDecode(format!("{} ({})", e, truncate_chars(&body, 100)))
        })?;

        if envelope.code != 0 {
            return Err(classify_api_code(envelope.code, &envelope.message));
        }

        envelope
            .data
            .ok_or_else(|| CollectorError::ProtocolDecode("missing data field".to_string()))
    }
}

#[async_trait]
impl SourceSearcher for BilibiliClient {
    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<CandidateSource>, CollectorError> {
        let query = [
            ("search_type", "video".to_string()),
            ("page", page.to_string()),
            ("page_size", SEARCH_PAGE_SIZE.to_string()),
            ("keyword", keyword.to_string()),
            ("source_tag", "3".to_string()),
        ];
        let data: SearchData = self.get_json(SEARCH_PATH, &query).await?;

        let sources: Vec<CandidateSource> = data
            .result
            .unwrap_or_default()
            .into_iter()
            .filter(|item| item.kind == "video" && item.id != 0)
            .map(|item| CandidateSource {
                source_id: item.id.to_string(),
                label: item.bvid,
                title: strip_html_tags(&item.title),
                popularity: value_as_u64(&item.play),
                size_signal: value_as_u64(&item.review).unwrap_or(0),
            })
            .collect();

        debug!(keyword, page, count = sources.len(), "search page parsed");
        Ok(sources)
    }

    fn name(&self) -> &'static str {
        "bilibili-search"
    }
}

#[async_trait]
impl CommentFetcher for BilibiliClient {
    async fn fetch_page(&self, source_id: &str, cursor: &str) -> Result<CommentPage, CollectorError> {
        let query = [
            ("oid", source_id.to_string()),
            ("type", "1".to_string()),
            // 按时间倒序
            ("mode", "2".to_string()),
            ("plat", "1".to_string()),
            ("pagination_str", json!({ "offset": cursor }).to_string()),
        ];
        let data: ReplyData = self.get_json(REPLY_PATH, &query).await?;

        let mut page = CommentPage::default();
        for reply in data.replies.unwrap_or_default() {
            match parse_reply(&reply, source_id) {
                Ok(record) => page.items.push(record),
                Err(e) => {
                    warn!(source_id, "skipping malformed reply: {}", e);
                    page.skipped += 1;
                }
            }
        }

        page.next_cursor = data.cursor.and_then(|c| {
            if c.is_end {
                None
            } else {
                c.pagination_reply
                    .and_then(|p| p.next_offset)
                    .filter(|offset| !offset.is_empty())
            }
        });

        Ok(page)
    }

    fn name(&self) -> &'static str {
        "bilibili-replies"
    }
}

/// 根据 HTTP 状态码分类错误
fn classify_status(status: StatusCode, body: &str) -> Option<CollectorError> {
    if status.is_success() {
        return None;
    }
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate_chars(body, 100));
    Some(match status.as_u16() {
        412 | 429 => CollectorError::RateLimited(detail),
        404 => CollectorError::FatalCollaborator(detail),
        _ => CollectorError::TransientNetwork(detail),
    })
}

/// 根据接口业务码分类错误
fn classify_api_code(code: i64, message: &str) -> CollectorError {
    let detail = format!("api code {}: {}", code, message);
    match code {
        // 请求被拦截 / 访问权限不足 / 请求过于频繁
        -412 | -403 | -509 | -799 => CollectorError::RateLimited(detail),
        // 内容不存在 / 评论区已关闭
        -404 | 12002 | 12061 => CollectorError::FatalCollaborator(detail),
        _ => CollectorError::TransientNetwork(detail),
    }
}

fn parse_reply(reply: &Value, source_id: &str) -> Result<RawRecord, CollectorError> {
    let missing = |field: &str| CollectorError::RecordData(format!("missing field {}", field));

    let comment_id = value_as_string(&reply["rpid"]).ok_or_else(|| missing("rpid"))?;
    let member = reply.get("member").ok_or_else(|| missing("member"))?;
    let content = reply["content"]["message"]
        .as_str()
        .ok_or_else(|| missing("content.message"))?;
    let ctime = reply["ctime"].as_i64().ok_or_else(|| missing("ctime"))?;
    let published_at: DateTime<Utc> = DateTime::from_timestamp(ctime, 0)
        .ok_or_else(|| CollectorError::RecordData(format!("invalid ctime {}", ctime)))?;

    Ok(RawRecord {
        source_id: source_id.to_string(),
        source_label: String::new(),
        source_title: String::new(),
        comment_id,
        author: AuthorInfo {
            user_id: value_as_string(&member["mid"]).ok_or_else(|| missing("member.mid"))?,
            user_name: member["uname"].as_str().unwrap_or_default().to_string(),
            gender: member["sex"].as_str().unwrap_or("未知").to_string(),
            level: member["level_info"]["current_level"].as_u64().unwrap_or(0) as u32,
            ip_location: reply["reply_control"]["location"]
                .as_str()
                .unwrap_or("未知")
                .to_string(),
        },
        content: content.to_string(),
        likes: reply["like"].as_u64().unwrap_or(0),
        published_at,
        platform: PLATFORM_BILIBILI.to_string(),
        keyword: String::new(),
    })
}

/// 数字可能以整数或字符串形式返回
fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
