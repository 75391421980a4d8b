// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    batch_id_of, create_test_app, wait_for_batch, wait_for_job, FakeBilibili, FakeClassifier,
    TestApp,
};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

async fn test_app() -> TestApp {
    create_test_app(
        Arc::new(FakeBilibili::new(&["a", "b"], 30)),
        Arc::new(FakeClassifier::new()),
    )
    .await
}

/// 提交一个手动任务并等待分类完成
async fn crawl_and_classify(app: &TestApp, target: &str, keywords: &[&str], quota: u32) {
    let response = app
        .server
        .post("/v1/crawl")
        .json(&json!({ "target_name": target, "keywords": keywords, "quota": quota }))
        .await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);

    let body: Value = response.json();
    let job_id = Uuid::parse_str(body["job_id"].as_str().unwrap()).unwrap();
    let status = wait_for_job(&app.pipeline, job_id).await;
    wait_for_batch(&app.pipeline, batch_id_of(&status)).await;
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
}

/// 测试目标的增删改查
#[tokio::test]
async fn test_target_lifecycle() {
    let app = test_app().await;

    let response = app
        .server
        .post("/v1/targets")
        .json(&json!({
            "name": "games",
            "keywords": [" rpg ", "rpg", "moba"],
            "interval_hours": 2
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["keywords"], json!(["rpg", "moba"]));
    assert_eq!(created["interval_hours"], 2);
    assert_eq!(app.scheduler.registered(), vec!["games".to_string()]);

    let duplicate = app
        .server
        .post("/v1/targets")
        .json(&json!({ "name": "games", "keywords": ["x"] }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let updated = app
        .server
        .put("/v1/targets/games")
        .json(&json!({ "quota": 50, "collecting": false }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    let updated: Value = updated.json();
    assert_eq!(updated["quota"], 50);
    assert!(app.scheduler.registered().is_empty());

    let listed: Value = app.server.get("/v1/targets").await.json();
    assert_eq!(listed["targets"].as_array().unwrap().len(), 1);
    assert_eq!(listed["total_data_count"], 0);

    let deleted = app.server.delete("/v1/targets/games").await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
    let missing = app.server.delete("/v1/targets/games").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["error"], "Not found: games");
}

/// 测试按名称子串查询目标
#[tokio::test]
async fn test_list_targets_by_name_substring() {
    let app = test_app().await;
    for name in ["Games-2024", "music"] {
        let response = app
            .server
            .post("/v1/targets")
            .json(&json!({ "name": name, "keywords": ["a"], "collecting": false }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let matched: Value = app
        .server
        .get("/v1/targets")
        .add_query_param("name", "games")
        .await
        .json();
    let targets = matched["targets"].as_array().unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0]["name"], "Games-2024");

    let all: Value = app.server.get("/v1/targets").await.json();
    assert_eq!(all["targets"].as_array().unwrap().len(), 2);

    let missing = app
        .server
        .get("/v1/targets")
        .add_query_param("name", "movies")
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_target_rejected() {
    let app = test_app().await;

    let empty_keywords = app
        .server
        .post("/v1/targets")
        .json(&json!({ "name": "games", "keywords": [] }))
        .await;
    assert_eq!(empty_keywords.status_code(), StatusCode::BAD_REQUEST);

    let blank_keywords = app
        .server
        .post("/v1/targets")
        .json(&json!({ "name": "games", "keywords": ["  "] }))
        .await;
    assert_eq!(blank_keywords.status_code(), StatusCode::BAD_REQUEST);

    let missing = app
        .server
        .put("/v1/targets/nobody")
        .json(&json!({ "quota": 5 }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

/// 测试带立即执行标记的目标创建后马上采集
#[tokio::test]
async fn test_immediate_target_is_collected() {
    let app = test_app().await;

    let response = app
        .server
        .post("/v1/targets")
        .json(&json!({ "name": "games", "keywords": ["a"], "quota": 10, "immediate": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["immediate"], false);

    timeout(Duration::from_secs(10), async {
        loop {
            let target = app.registry.get("games").await.unwrap().unwrap();
            if target.collected_count == 10 && target.warning_count == 3 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("immediate run did not finish");
}

/// 测试手动提交和状态查询
#[tokio::test]
async fn test_crawl_submission_and_status() {
    let app = test_app().await;

    let unknown = app
        .server
        .post("/v1/crawl")
        .json(&json!({ "target_name": "games" }))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

    let zero_quota = app
        .server
        .post("/v1/crawl")
        .json(&json!({ "target_name": "games", "keywords": ["a"], "quota": 0 }))
        .await;
    assert_eq!(zero_quota.status_code(), StatusCode::BAD_REQUEST);

    let accepted = app
        .server
        .post("/v1/crawl")
        .json(&json!({ "target_name": "games", "keywords": ["a"], "quota": 5 }))
        .await;
    assert_eq!(accepted.status_code(), StatusCode::ACCEPTED);
    let job_id = Uuid::parse_str(accepted.json::<Value>()["job_id"].as_str().unwrap()).unwrap();

    let batch_id = batch_id_of(&wait_for_job(&app.pipeline, job_id).await);
    let job: Value = app.server.get(&format!("/v1/crawl/{}", job_id)).await.json();
    assert_eq!(job["status"], "completed");
    assert_eq!(job["detail"]["collected"], 5);

    wait_for_batch(&app.pipeline, batch_id).await;
    let batch: Value = app.server.get(&format!("/v1/batches/{}", batch_id)).await.json();
    assert_eq!(batch["status"], "completed");
    assert_eq!(batch["detail"]["processed"], 5);

    let not_found = app
        .server
        .get(&format!("/v1/crawl/{}", Uuid::new_v4()))
        .await;
    assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
}

/// 测试统计和筛选接口
#[tokio::test]
async fn test_analytics_over_classified_records() {
    let app = test_app().await;
    let created = app
        .server
        .post("/v1/targets")
        .json(&json!({ "name": "games", "keywords": ["a"], "collecting": false }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    crawl_and_classify(&app, "games", &["a"], 10).await;

    let summary: Value = app
        .server
        .get("/v1/analytics/summary")
        .add_query_param("target", "games")
        .await
        .json();
    assert_eq!(summary["total"], 10);
    assert_eq!(summary["platform_share"][0]["name"], "bilibili");
    assert_eq!(summary["platform_share"][0]["value"], 100.0);
    assert_eq!(summary["last_7_days"].as_array().unwrap().len(), 1);

    let filtered: Value = app
        .server
        .post("/v1/analytics/filter")
        .json(&json!({ "target": "games", "sentiment": "negative", "limit": 2 }))
        .await
        .json();
    assert_eq!(filtered["total_data_count"], 3);
    assert_eq!(filtered["negative_count"], 3);
    assert_eq!(filtered["today_new_count"], 3);
    assert_eq!(filtered["records"].as_array().unwrap().len(), 2);
    assert_eq!(filtered["records"][0]["sentiment"], "negative");

    let bad_range = app
        .server
        .post("/v1/analytics/filter")
        .json(&json!({ "start_date": "2025-03-10", "end_date": "2025-03-01" }))
        .await;
    assert_eq!(bad_range.status_code(), StatusCode::BAD_REQUEST);
}
