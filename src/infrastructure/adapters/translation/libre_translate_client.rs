//! LibreTranslate Client - 二次翻译 HTTP 客户端
//!
//! 实现 TranslatorPort trait
//!
//! 外部翻译 API:
//! POST {base_url}/translate
//! Request: {"q": "...", "source": "ja", "target": "en", "format": "text"}
//! Response: {"translatedText": "..."}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{TranslateError, TranslatorPort};

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

/// LibreTranslate 客户端配置
#[derive(Debug, Clone)]
pub struct LibreTranslateConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LibreTranslateConfig {
    fn default() -> Self {
        Self {
            base_url: "http://libretranslate:5000".to_string(),
            timeout_secs: 60,
        }
    }
}

impl LibreTranslateConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

pub struct LibreTranslateClient {
    client: Client,
    config: LibreTranslateConfig,
}

impl LibreTranslateClient {
    pub fn new(config: LibreTranslateConfig) -> Result<Self, TranslateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslateError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

#[async_trait]
impl TranslatorPort for LibreTranslateClient {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        tracing::info!(
            source = %source,
            target = %target,
            chars = text.len(),
            "Translating with LibreTranslate"
        );

        let response = self
            .client
            .post(format!("{}/translate", self.base()))
            .json(&TranslateRequest {
                q: text,
                source,
                target,
                format: "text",
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslateError::Timeout
                } else if e.is_connect() {
                    TranslateError::NetworkError(format!("Cannot connect to translation service: {}", e))
                } else {
                    TranslateError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TranslateError::ServiceError(format!("HTTP {}: {}", status, error_text)));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            chars_in = text.len(),
            chars_out = body.translated_text.len(),
            "LibreTranslate translation successful"
        );
        Ok(body.translated_text)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/languages", self.base()))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
