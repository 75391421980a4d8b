// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yuqing::config::settings::BaiduSettings;
use yuqing::engines::baidu_nlp::BaiduSentimentClient;
use yuqing::engines::traits::{ClassifierError, SentimentClassifier};

const TOKEN_PATH: &str = "/oauth/2.0/token";
const SENTIMENT_PATH: &str = "/rpc/2.0/nlp/v1/sentiment_classify";

fn client(server: &MockServer) -> BaiduSentimentClient {
    BaiduSentimentClient::new(&BaiduSettings {
        base_url: server.uri(),
        api_key: "ak".into(),
        secret_key: "sk".into(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn token(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": value,
        "expires_in": 2592000
    }))
}

fn sentiment(code: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "log_id": 1,
        "text": "x",
        "items": [{"sentiment": code, "confidence": 0.87, "positive_prob": 0.9, "negative_prob": 0.1}]
    }))
}

#[tokio::test]
async fn test_token_is_fetched_once_and_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(query_param("grant_type", "client_credentials"))
        .and(query_param("client_id", "ak"))
        .and(query_param("client_secret", "sk"))
        .respond_with(token("t1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SENTIMENT_PATH))
        .and(query_param("access_token", "t1"))
        .and(body_json(json!({"text": "很好看"})))
        .respond_with(sentiment(2))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    for _ in 0..2 {
        let response = client.classify("很好看").await.unwrap();
        assert_eq!(response.sentiment, Some(2));
        assert_eq!(response.confidence, Some(0.87));
    }
}

#[tokio::test]
async fn test_api_error_code_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token("t1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SENTIMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": 18,
            "error_msg": "Open api qps request limit reached"
        })))
        .mount(&server)
        .await;

    let error = client(&server).classify("text").await.unwrap_err();
    assert_eq!(
        error,
        ClassifierError::Api {
            code: 18,
            message: "Open api qps request limit reached".into()
        }
    );
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token("stale"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token("fresh"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SENTIMENT_PATH))
        .and(query_param("access_token", "stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": 111,
            "error_msg": "Access token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SENTIMENT_PATH))
        .and(query_param("access_token", "fresh"))
        .respond_with(sentiment(0))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server).classify("太差了").await.unwrap();
    assert_eq!(response.sentiment, Some(0));
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "unknown client id"
        })))
        .mount(&server)
        .await;

    let error = client(&server).classify("text").await.unwrap_err();
    assert!(matches!(error, ClassifierError::Auth(ref m) if m.contains("invalid_client")));
}

#[tokio::test]
async fn test_missing_items_yield_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token("t1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SENTIMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"log_id": 1, "items": []})))
        .mount(&server)
        .await;

    let response = client(&server).classify("text").await.unwrap();
    assert_eq!(response.sentiment, None);
}
