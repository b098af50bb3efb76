//! Translator Port - 二次翻译服务

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait TranslatorPort: Send + Sync {
    /// 后端名称，写入任务结果
    fn name(&self) -> &'static str;

    /// 翻译一段文本（多行以换行分隔）
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError>;

    async fn health_check(&self) -> bool {
        true
    }
}
