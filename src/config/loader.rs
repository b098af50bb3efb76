//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `AUTOCAPTION_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `AUTOCAPTION_SERVER__PORT=8000`
/// - `AUTOCAPTION_ENGINE__URL=http://whisper-server:5000`
/// - `AUTOCAPTION_CLIENT__SERVICE_URL=http://auto-caption-web:8000`
/// - `AUTOCAPTION_HOST__API_KEY=...`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级），其余字段由 serde default 补齐
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("engine.url", "http://whisper-server:5000")?
        .set_default("engine.timeout_secs", 3600)?
        .set_default("translation.url", "http://libretranslate:5000")?
        .set_default("pipeline.canonical_language", "en")?
        .set_default("pipeline.workers", 2)?
        .set_default("client.service_url", "http://auto-caption-web:8000")?
        .set_default("client.poll_interval_secs", 2)?
        .set_default("batch.parent_tag", "Foreign Language")?
        .set_default("batch.max_batch_size", 20)?
        .set_default("batch.cooldown_secs", 10)?
        .set_default("host.url", "http://localhost:9999/graphql")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），例如 AUTOCAPTION_BATCH__MAX_BATCH_SIZE=5
    builder = builder.add_source(
        Environment::with_prefix("AUTOCAPTION")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("Server port cannot be 0"));
    }

    if config.engine.url.is_empty() {
        return Err(invalid("Engine URL cannot be empty"));
    }

    if config.translation.enabled && config.translation.url.is_empty() {
        return Err(invalid("Translation URL cannot be empty when translation is enabled"));
    }

    if config.pipeline.canonical_language.is_empty() {
        return Err(invalid("Canonical language cannot be empty"));
    }

    if config.pipeline.workers == 0 {
        return Err(invalid("Worker pool size cannot be 0"));
    }

    if config.pipeline.queue_size == 0 || config.pipeline.store_capacity == 0 {
        return Err(invalid("Task queue size and store capacity must be positive"));
    }

    config
        .pipeline
        .weights
        .secondary
        .validate()
        .map_err(|e| invalid(format!("pipeline.weights.secondary: {}", e)))?;
    config
        .pipeline
        .weights
        .engine
        .validate()
        .map_err(|e| invalid(format!("pipeline.weights.engine: {}", e)))?;

    if config.client.service_url.is_empty() {
        return Err(invalid("Caption service URL cannot be empty"));
    }

    if config.client.poll_interval_secs == 0 {
        return Err(invalid("Poll interval cannot be 0"));
    }

    if config.batch.max_batch_size == 0 {
        return Err(invalid("Batch size cannot be 0"));
    }

    if config.batch.page_size == 0 {
        return Err(invalid("Batch page size cannot be 0"));
    }

    if config.batch.parent_tag.trim().is_empty() {
        return Err(invalid("Batch parent tag cannot be empty"));
    }

    if config.host.url.is_empty() {
        return Err(invalid("Host GraphQL URL cannot be empty"));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Engine URL: {} (streaming: {})", config.engine.url, config.engine.streaming);
    tracing::info!("Engine Timeout: {}s", config.engine.timeout_secs);
    if config.translation.enabled {
        tracing::info!("Translation URL: {}", config.translation.url);
    } else {
        tracing::info!("Translation: disabled");
    }
    tracing::info!("Canonical Language: {}", config.pipeline.canonical_language);
    tracing::info!("Workers: {}", config.pipeline.workers);
    tracing::info!("Temp Directory: {:?}", config.pipeline.temp_dir);
    tracing::info!("Caption Service: {}", config.client.service_url);
    tracing::info!("Host GraphQL: {}", config.host.url);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
