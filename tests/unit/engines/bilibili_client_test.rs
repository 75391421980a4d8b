// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yuqing::config::settings::BilibiliSettings;
use yuqing::engines::bilibili::BilibiliClient;
use yuqing::engines::traits::{CommentFetcher, SourceSearcher};
use yuqing::utils::errors::CollectorError;

fn client(server: &MockServer) -> BilibiliClient {
    BilibiliClient::new(&BilibiliSettings {
        base_url: server.uri(),
        user_agent: "yuqing-test".into(),
        cookie: Some("SESSDATA=test".into()),
        timeout_secs: 5,
    })
    .unwrap()
}

fn reply(rpid: u64, message: &str) -> serde_json::Value {
    json!({
        "rpid": rpid,
        "ctime": 1711540800,
        "like": 3,
        "member": {"mid": "42", "uname": "viewer", "sex": "保密", "level_info": {"current_level": 4}},
        "content": {"message": message},
        "reply_control": {"location": "IP属地：北京"}
    })
}

#[tokio::test]
async fn test_search_parses_videos_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x/web-interface/wbi/search/type"))
        .and(query_param("keyword", "原神"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "message": "0",
            "data": {"result": [
                {"type": "video", "id": 1001, "bvid": "BV1xx", "title": "<em class=\"keyword\">原神</em>攻略", "play": 5000, "review": 120},
                {"type": "video", "id": 1002, "bvid": "BV2xx", "title": "plain", "play": "--", "review": "8"},
                {"type": "ketang", "id": 9, "bvid": "", "title": "course", "play": 1, "review": 1}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sources = client(&server).search("原神", 2).await.unwrap();

    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].source_id, "1001");
    assert_eq!(sources[0].label, "BV1xx");
    assert_eq!(sources[0].title, "原神攻略");
    assert_eq!(sources[0].popularity, Some(5000));
    assert_eq!(sources[1].popularity, None);
    assert_eq!(sources[1].size_signal, 8);
}

#[tokio::test]
async fn test_search_without_results_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x/web-interface/wbi/search/type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"numResults": 0}
        })))
        .mount(&server)
        .await;

    assert!(client(&server).search("nothing", 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_page_returns_cursor_and_skips_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x/v2/reply/main"))
        .and(query_param("oid", "1001"))
        .and(query_param("mode", "2"))
        .and(query_param("pagination_str", r#"{"offset":""}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "replies": [reply(1, "第一条"), {"rpid": 2}, reply(3, "第三条")],
                "cursor": {"is_end": false, "pagination_reply": {"next_offset": "CURSOR-2"}}
            }
        })))
        .mount(&server)
        .await;

    let page = client(&server).fetch_page("1001", "").await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.skipped, 1);
    assert_eq!(page.next_cursor.as_deref(), Some("CURSOR-2"));
    assert_eq!(page.items[1].content, "第三条");
    assert_eq!(page.items[0].author.ip_location, "IP属地：北京");
}

#[tokio::test]
async fn test_fetch_last_page_has_no_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x/v2/reply/main"))
        .and(query_param("pagination_str", r#"{"offset":"CURSOR-2"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "replies": [reply(4, "最后一条")],
                "cursor": {"is_end": true, "pagination_reply": {"next_offset": "CURSOR-3"}}
            }
        })))
        .mount(&server)
        .await;

    let page = client(&server).fetch_page("1001", "CURSOR-2").await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_error_classification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x/v2/reply/main"))
        .and(query_param("oid", "banned"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": -412,
            "message": "请求被拦截"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/v2/reply/main"))
        .and(query_param("oid", "closed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 12002,
            "message": "评论区已关闭"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/v2/reply/main"))
        .and(query_param("oid", "throttled"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/v2/reply/main"))
        .and(query_param("oid", "garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/v2/reply/main"))
        .and(query_param("oid", "flaky"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(matches!(
        client.fetch_page("banned", "").await,
        Err(CollectorError::RateLimited(_))
    ));
    assert!(matches!(
        client.fetch_page("closed", "").await,
        Err(CollectorError::FatalCollaborator(_))
    ));
    assert!(matches!(
        client.fetch_page("throttled", "").await,
        Err(CollectorError::RateLimited(_))
    ));
    assert!(matches!(
        client.fetch_page("garbled", "").await,
        Err(CollectorError::ProtocolDecode(_))
    ));
    assert!(matches!(
        client.fetch_page("flaky", "").await,
        Err(CollectorError::TransientNetwork(_))
    ));
}
