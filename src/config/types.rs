//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::StageWeights;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 识别引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 二次翻译服务配置
    #[serde(default)]
    pub translation: TranslationConfig,

    /// 任务流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 轮询客户端配置
    #[serde(default)]
    pub client: ClientConfig,

    /// 批处理配置
    #[serde(default)]
    pub batch: BatchSettings,

    /// 宿主（GraphQL）配置
    #[serde(default)]
    pub host: HostConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 识别引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// 识别服务基础 URL
    #[serde(default = "default_engine_url")]
    pub url: String,

    /// 单次转写的超时时间（秒）
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,

    /// 是否使用 NDJSON 流式进度；关闭时走单次阻塞请求
    #[serde(default = "default_true")]
    pub streaming: bool,
}

fn default_engine_url() -> String {
    "http://whisper-server:5000".to_string()
}

fn default_engine_timeout() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            timeout_secs: default_engine_timeout(),
            streaming: true,
        }
    }
}

/// 二次翻译服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    /// 关闭后非规范语言的翻译请求会失败
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_translation_url")]
    pub url: String,

    #[serde(default = "default_translation_timeout")]
    pub timeout_secs: u64,
}

fn default_translation_url() -> String {
    "http://libretranslate:5000".to_string()
}

fn default_translation_timeout() -> u64 {
    60
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_translation_url(),
            timeout_secs: default_translation_timeout(),
        }
    }
}

/// 阶段权重表
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    /// 二次翻译路径（同时用于无翻译任务）
    #[serde(default = "default_secondary_weights")]
    pub secondary: StageWeights,

    /// 引擎直接翻译路径
    #[serde(default = "default_engine_weights")]
    pub engine: StageWeights,
}

fn default_secondary_weights() -> StageWeights {
    StageWeights::SECONDARY
}

fn default_engine_weights() -> StageWeights {
    StageWeights::ENGINE_TRANSLATED
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            secondary: default_secondary_weights(),
            engine: default_engine_weights(),
        }
    }
}

/// 任务流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 引擎可直接翻译到的语言
    #[serde(default = "default_canonical_language")]
    pub canonical_language: String,

    /// 临时音频目录
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: String,

    /// Worker 并发数
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// 任务队列长度
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// 内存中最多保留的任务数
    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,

    /// 已结束且未被查询的任务保留时长（秒）
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,

    #[serde(default)]
    pub weights: WeightsConfig,
}

fn default_canonical_language() -> String {
    "en".to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("auto-caption")
}

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_workers() -> usize {
    2
}

fn default_queue_size() -> usize {
    1000
}

fn default_store_capacity() -> usize {
    1000
}

fn default_idle_secs() -> u64 {
    600
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canonical_language: default_canonical_language(),
            temp_dir: default_temp_dir(),
            ffmpeg_binary: default_ffmpeg_binary(),
            workers: default_workers(),
            queue_size: default_queue_size(),
            store_capacity: default_store_capacity(),
            idle_secs: default_idle_secs(),
            weights: WeightsConfig::default(),
        }
    }
}

/// 轮询客户端配置
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// 字幕服务地址
    #[serde(default = "default_service_url")]
    pub service_url: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,

    /// 成功后的冷却时间（秒）
    #[serde(default)]
    pub cooldown_secs: u64,
}

fn default_service_url() -> String {
    "http://auto-caption-web:8000".to_string()
}

fn default_poll_interval() -> u64 {
    2
}

fn default_client_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_client_timeout(),
            cooldown_secs: 0,
        }
    }
}

/// 批处理配置
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    /// 语言标签的父标签名
    #[serde(default = "default_parent_tag")]
    pub parent_tag: String,

    /// 已有字幕的标签名
    #[serde(default = "default_subtitled_label")]
    pub subtitled_label: String,

    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// 投递给每个任务的冷却提示（秒）
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// 相邻两次投递之间的间隔（毫秒）
    #[serde(default)]
    pub submit_interval_ms: u64,

    #[serde(default)]
    pub dedupe_within_run: bool,

    /// 批处理任务的目标语言，同时决定已有字幕的文件后缀
    #[serde(default = "default_canonical_language")]
    pub translate_to: String,
}

fn default_parent_tag() -> String {
    "Foreign Language".to_string()
}

fn default_subtitled_label() -> String {
    "Subtitled".to_string()
}

fn default_max_batch_size() -> usize {
    20
}

fn default_page_size() -> u32 {
    5000
}

fn default_cooldown() -> u64 {
    10
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            parent_tag: default_parent_tag(),
            subtitled_label: default_subtitled_label(),
            max_batch_size: default_max_batch_size(),
            page_size: default_page_size(),
            cooldown_secs: default_cooldown(),
            submit_interval_ms: 0,
            dedupe_within_run: false,
            translate_to: default_canonical_language(),
        }
    }
}

/// 宿主（GraphQL）配置
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_plugin_id")]
    pub plugin_id: String,

    /// 宿主插件中单条目任务的名称
    #[serde(default = "default_task_name")]
    pub task_name: String,

    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
}

fn default_host_url() -> String {
    "http://localhost:9999/graphql".to_string()
}

fn default_plugin_id() -> String {
    "stash-auto-caption".to_string()
}

fn default_task_name() -> String {
    "Generate Caption for Scene".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            url: default_host_url(),
            api_key: None,
            plugin_id: default_plugin_id(),
            task_name: default_task_name(),
            timeout_secs: default_client_timeout(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
