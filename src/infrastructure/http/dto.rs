//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::TaskStatusView;
use crate::domain::TaskStatus;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }

    /// 错误响应
    pub fn error(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Caption DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCaptionRequest {
    pub video_path: String,
    /// 空字符串或 "auto" 表示自动识别
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub translate_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartCaptionResponse {
    pub task_id: String,
    pub status: TaskStatus,
}

/// 结果未就绪时的响应体
#[derive(Debug, Serialize)]
pub struct PendingResultResponse {
    pub status: TaskStatus,
    pub progress: f64,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub total: usize,
    pub tasks: Vec<TaskStatusView>,
}

// ============================================================================
// Health DTOs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub engine: bool,
    /// 未配置翻译服务时为 null
    pub translation: Option<bool>,
    pub active_tasks: usize,
}
