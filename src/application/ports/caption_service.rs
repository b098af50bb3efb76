//! Caption Service Port - 远程字幕服务客户端
//!
//! 轮询客户端通过此端口启动任务并查询状态

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::CaptionResult;

#[derive(Debug, Error)]
pub enum CaptionServiceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error ({errno}): {message}")]
    ServiceError { errno: i32, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 启动任务请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartTaskRequest {
    pub video_path: String,
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartTaskResponse {
    pub task_id: String,
    pub status: String,
}

/// 任务状态报告
///
/// `status` 保留原始字符串，未知状态交给调用方判定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub task_id: String,
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<CaptionResult>,
}

#[async_trait]
pub trait CaptionServicePort: Send + Sync {
    /// 将配置的服务地址解析为实际访问地址
    async fn resolve_endpoint(&self, configured: &str) -> String;

    async fn start_task(&self, endpoint: &str, request: &StartTaskRequest) -> Result<StartTaskResponse, CaptionServiceError>;

    async fn task_status(&self, endpoint: &str, task_id: &str) -> Result<TaskStatusReport, CaptionServiceError>;
}
