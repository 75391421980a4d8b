// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BaiduSettings;
use crate::engines::traits::{ClassifierError, ClassifierResponse, SentimentClassifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

const TOKEN_PATH: &str = "/oauth/2.0/token";
const SENTIMENT_PATH: &str = "/rpc/2.0/nlp/v1/sentiment_classify";
/// 令牌失效 / 过期
const TOKEN_INVALID_CODES: [i64; 2] = [110, 111];

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: u64,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    error_code: Option<i64>,
    error_msg: Option<String>,
    #[serde(default)]
    items: Vec<SentimentItem>,
}

#[derive(Debug, Deserialize)]
struct SentimentItem {
    sentiment: Option<i64>,
    confidence: Option<f64>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// 百度NLP情感倾向分析客户端
pub struct BaiduSentimentClient {
    client: Client,
    base_url: Url,
    api_key: String,
    secret_key: String,
    token: RwLock<Option<CachedToken>>,
}

impl BaiduSentimentClient {
    pub fn new(settings: &BaiduSettings) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| ClassifierError::Transport(format!("invalid base url: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone(),
            secret_key: settings.secret_key.clone(),
            token: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClassifierError> {
        self.base_url
            .join(path)
            .map_err(|e| ClassifierError::Transport(e.to_string()))
    }

    async fn access_token(&self) -> Result<String, ClassifierError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.token.clone());
            }
        }

        let response: TokenResponse = self
            .client
            .post(self.endpoint(TOKEN_PATH)?)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.secret_key.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        let token = match (response.access_token, response.error) {
            (Some(token), None) => token,
            (_, error) => {
                return Err(ClassifierError::Auth(format!(
                    "{}: {}",
                    error.unwrap_or_else(|| "no_token".to_string()),
                    response.error_description.unwrap_or_default()
                )))
            }
        };

        // 提前一分钟过期，避免临界时刻使用失效令牌
        let ttl = Duration::from_secs(response.expires_in.saturating_sub(60).max(60));
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + ttl,
        });
        info!("Baidu access token refreshed, ttl {}s", ttl.as_secs());
        Ok(token)
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    async fn request(&self, text: &str) -> Result<ClassifierResponse, ClassifierError> {
        let token = self.access_token().await?;
        let response: SentimentResponse = self
            .client
            .post(self.endpoint(SENTIMENT_PATH)?)
            .query(&[("charset", "UTF-8"), ("access_token", token.as_str())])
            .json(&json!({ "text": text }))
            .send()
            .await?
            .json()
            .await?;

        if let Some(code) = response.error_code {
            return Err(ClassifierError::Api {
                code,
                message: response.error_msg.unwrap_or_default(),
            });
        }

        Ok(response
            .items
            .first()
            .map(|item| ClassifierResponse {
                sentiment: item.sentiment,
                confidence: item.confidence,
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl SentimentClassifier for BaiduSentimentClient {
    async fn classify(&self, text: &str) -> Result<ClassifierResponse, ClassifierError> {
        match self.request(text).await {
            Err(ClassifierError::Api { code, .. }) if TOKEN_INVALID_CODES.contains(&code) => {
                debug!(code, "access token rejected, refreshing once");
                self.invalidate_token().await;
                self.request(text).await
            }
            other => other,
        }
    }

    fn name(&self) -> &'static str {
        "baidu-nlp"
    }
}
