//! HTTP Caption Service Client - 远程字幕服务客户端
//!
//! 实现 CaptionServicePort trait
//!
//! 字幕服务 API（响应统一为 {errno, error, data}）:
//! POST {endpoint}/auto-caption/start
//! GET  {endpoint}/auto-caption/status/{task_id}

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::application::ports::{
    CaptionServiceError, CaptionServicePort, StartTaskRequest, StartTaskResponse, TaskStatusReport,
};

pub const DEFAULT_SERVICE_URL: &str = "http://auto-caption-web:8000";
const DEFAULT_PORT: u16 = 8000;

/// 统一响应信封
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    errno: i32,
    #[serde(default)]
    error: String,
    data: Option<T>,
}

/// 字幕服务客户端配置
#[derive(Debug, Clone)]
pub struct HttpCaptionServiceConfig {
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for HttpCaptionServiceConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

pub struct HttpCaptionServiceClient {
    client: Client,
}

impl HttpCaptionServiceClient {
    pub fn new(config: HttpCaptionServiceConfig) -> Result<Self, CaptionServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CaptionServiceError::NetworkError(e.to_string()))?;
        Ok(Self { client })
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CaptionServiceError> {
        let status = response.status();
        let text = response.text().await.map_err(map_request_error)?;

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                CaptionServiceError::InvalidResponse(e.to_string())
            } else {
                CaptionServiceError::ServiceError {
                    errno: i32::from(status.as_u16()),
                    message: text.clone(),
                }
            }
        })?;

        if envelope.errno != 0 {
            return Err(CaptionServiceError::ServiceError {
                errno: envelope.errno,
                message: envelope.error,
            });
        }
        envelope
            .data
            .ok_or_else(|| CaptionServiceError::InvalidResponse("missing data".to_string()))
    }
}

fn map_request_error(e: reqwest::Error) -> CaptionServiceError {
    if e.is_timeout() {
        CaptionServiceError::Timeout
    } else if e.is_connect() {
        CaptionServiceError::NetworkError(format!("Cannot connect to caption service: {}", e))
    } else {
        CaptionServiceError::NetworkError(e.to_string())
    }
}

/// 解析服务地址
///
/// - 空地址使用默认地址，缺省端口为 8000
/// - localhost 与 IP 地址原样使用
/// - 其他主机名（如容器名）做一次 DNS 解析，取第一个地址；解析失败时保留主机名
pub async fn resolve_service_url(configured: &str) -> String {
    resolve_with(configured, |host, port| async move {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok::<_, io::Error>(addrs.collect::<Vec<SocketAddr>>())
    })
    .await
}

async fn resolve_with<F, Fut>(configured: &str, lookup: F) -> String
where
    F: FnOnce(String, u16) -> Fut,
    Fut: Future<Output = io::Result<Vec<SocketAddr>>>,
{
    let configured = configured.trim();
    let configured = if configured.is_empty() {
        DEFAULT_SERVICE_URL.to_string()
    } else if configured.contains("://") {
        configured.to_string()
    } else {
        format!("http://{}", configured)
    };

    let url = match Url::parse(&configured) {
        Ok(url) if url.host_str().is_some() => url,
        Ok(_) | Err(_) => {
            tracing::warn!(url = %configured, "Failed to parse service URL, using fallback");
            return DEFAULT_SERVICE_URL.to_string();
        }
    };

    let scheme = url.scheme().to_string();
    let host = url.host_str().unwrap_or_default().to_string();
    let port = url.port().unwrap_or(DEFAULT_PORT);
    let bare_host = host.trim_start_matches('[').trim_end_matches(']');

    if host == "localhost" || bare_host.parse::<IpAddr>().is_ok() {
        let resolved = format!("{}://{}:{}", scheme, host, port);
        tracing::info!(url = %resolved, "Using service URL as configured");
        return resolved;
    }

    match lookup(host.clone(), port).await {
        Ok(addrs) => match addrs.first() {
            Some(addr) => {
                let resolved = format!("{}://{}", scheme, addr);
                tracing::info!(host = %host, url = %resolved, "Resolved service host");
                resolved
            }
            None => {
                tracing::warn!(host = %host, "No addresses for service host, using hostname");
                format!("{}://{}:{}", scheme, host, port)
            }
        },
        Err(e) => {
            tracing::warn!(host = %host, error = %e, "DNS lookup failed, using hostname");
            format!("{}://{}:{}", scheme, host, port)
        }
    }
}

#[async_trait]
impl CaptionServicePort for HttpCaptionServiceClient {
    async fn resolve_endpoint(&self, configured: &str) -> String {
        resolve_service_url(configured).await
    }

    async fn start_task(
        &self,
        endpoint: &str,
        request: &StartTaskRequest,
    ) -> Result<StartTaskResponse, CaptionServiceError> {
        let url = format!("{}/auto-caption/start", endpoint.trim_end_matches('/'));
        tracing::debug!(url = %url, video_path = %request.video_path, "Starting caption task");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_request_error)?;
        Self::unwrap_envelope(response).await
    }

    async fn task_status(&self, endpoint: &str, task_id: &str) -> Result<TaskStatusReport, CaptionServiceError> {
        let url = format!("{}/auto-caption/status/{}", endpoint.trim_end_matches('/'), task_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;
        Self::unwrap_envelope(response).await
    }
}
