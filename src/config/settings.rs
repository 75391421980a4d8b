// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、存储、爬取、退避、情感分析、调度以及外部协作方的所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 目标注册表配置
    pub registry: RegistrySettings,
    /// 爬取配置
    pub crawl: CrawlSettings,
    /// 退避配置
    pub backoff: BackoffSettings,
    /// 情感分析配置
    pub sentiment: SentimentSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// B站接口配置
    pub bilibili: BilibiliSettings,
    /// 百度NLP配置
    pub baidu: BaiduSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储类型 (local, memory)
    pub storage_type: String,
    /// 本地存储路径 (当 type=local 时使用)
    pub local_path: Option<String>,
}

/// 目标注册表配置
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    /// 注册表文档在存储中的键
    pub key: String,
}

/// 爬取配置
///
/// 候选上限和页数上限是经验值，保持可调
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// 每页名义评论条数
    pub page_size: u32,
    /// 单个内容源最多翻页数
    pub max_pages: u32,
    /// 每个关键字最多考虑的候选数
    pub max_candidates: usize,
    /// 每个关键字最多请求的搜索页数
    pub search_pages: u32,
    /// 候选最小规模（评论数）
    pub min_source_size: u64,
    /// 候选最小互动量（播放数），低于此值直接跳过
    pub min_engagement: u64,
    /// 单页重试上限
    pub retry_ceiling: u32,
    /// 两次请求之间的间隔（毫秒）
    pub request_interval_ms: u64,
}

/// 退避配置
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffSettings {
    /// 瞬时错误初始退避（毫秒）
    pub transient_initial_ms: u64,
    /// 限流错误初始退避（毫秒）
    pub rate_limit_initial_ms: u64,
    /// 最大退避（秒）
    pub max_backoff_secs: u64,
    /// 退避乘数
    pub multiplier: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
    /// 抖动因子
    pub jitter_factor: f64,
}

/// 情感分析配置
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentSettings {
    /// 致命错误码集合，命中时立即终止当前批次
    pub fatal_codes: Vec<i64>,
    /// 每处理多少条记录保存一次检查点
    pub checkpoint_every: usize,
    /// 两次分类调用之间的间隔（毫秒）
    pub call_interval_ms: u64,
    /// 单个批次的处理时限（秒）
    pub batch_timeout_secs: u64,
}

/// 调度器配置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 是否启用定时调度
    pub enabled: bool,
    /// 与注册表重新同步的间隔（秒）
    pub resync_interval_secs: u64,
}

/// B站接口配置
#[derive(Debug, Clone, Deserialize)]
pub struct BilibiliSettings {
    pub base_url: String,
    pub user_agent: String,
    pub cookie: Option<String>,
    pub timeout_secs: u64,
}

/// 百度NLP配置
#[derive(Debug, Clone, Deserialize)]
pub struct BaiduSettings {
    pub base_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub timeout_secs: u64,
}

/// 指标导出配置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`，
    /// 最后由 `YUQING__` 前缀的环境变量覆盖
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::with_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("YUQING").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅使用内置默认值
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::with_defaults(Config::builder())?
            .build()?
            .try_deserialize()
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("storage.storage_type", "local")?
            .set_default("storage.local_path", "./res_file")?
            .set_default("registry.key", "keyword_groups.json")?
            .set_default("crawl.page_size", 20)?
            .set_default("crawl.max_pages", 50)?
            .set_default("crawl.max_candidates", 50)?
            .set_default("crawl.search_pages", 5)?
            .set_default("crawl.min_source_size", 1)?
            .set_default("crawl.min_engagement", 0)?
            .set_default("crawl.retry_ceiling", 3)?
            .set_default("crawl.request_interval_ms", 200)?
            .set_default("backoff.transient_initial_ms", 2000)?
            .set_default("backoff.rate_limit_initial_ms", 10000)?
            .set_default("backoff.max_backoff_secs", 60)?
            .set_default("backoff.multiplier", 2.0)?
            .set_default("backoff.enable_jitter", true)?
            .set_default("backoff.jitter_factor", 0.1)?
            .set_default("sentiment.fatal_codes", vec![6, 17, 18, 19, 110, 111])?
            .set_default("sentiment.checkpoint_every", 50)?
            .set_default("sentiment.call_interval_ms", 500)?
            .set_default("sentiment.batch_timeout_secs", 6000)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.resync_interval_secs", 60)?
            .set_default("bilibili.base_url", "https://api.bilibili.com")?
            .set_default(
                "bilibili.user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )?
            .set_default("bilibili.timeout_secs", 10)?
            .set_default("baidu.base_url", "https://aip.baidubce.com")?
            .set_default("baidu.api_key", "")?
            .set_default("baidu.secret_key", "")?
            .set_default("baidu.timeout_secs", 10)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
