//! 应用层错误定义
//!
//! 统一的命令/查询错误类型，以及轮询客户端与批处理的运行错误

use thiserror::Error;

use crate::application::ports::{ArtifactError, CaptionServiceError, HostError, StoreError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ApplicationError {
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

impl From<StoreError> for ApplicationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::not_found("Task", id),
            StoreError::AlreadyExists(id) => Self::invalid_state(format!("Task already exists: {}", id)),
            StoreError::QueueUnavailable(msg) => Self::ExternalServiceError(msg),
            StoreError::Transition(e) => Self::invalid_state(e.to_string()),
        }
    }
}

impl From<ArtifactError> for ApplicationError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::NotFound(path) => Self::not_found("Media file", path),
            ArtifactError::NotAFile(_) | ArtifactError::PermissionDenied(_) => {
                Self::validation(err.to_string())
            }
            ArtifactError::InvalidPattern(_) | ArtifactError::IoError(_) => {
                Self::StorageError(err.to_string())
            }
        }
    }
}

/// 单任务轮询运行错误
#[derive(Debug, Error)]
pub enum GenerateError {
    /// 参数不满足前置条件，未发起任何请求
    #[error("{0}")]
    Precondition(String),

    #[error("failed to start caption task: {0}")]
    Start(#[source] CaptionServiceError),

    #[error("failed to get task status: {0}")]
    Status(#[source] CaptionServiceError),

    #[error("caption generation failed: {0}")]
    TaskFailed(String),

    #[error("unknown task status: {0}")]
    UnknownStatus(String),

    #[error("task interrupted")]
    Interrupted,
}

/// 批处理错误（结构性前置条件或发现阶段失败）
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("'{0}' tag not found - please create it in the media library")]
    MissingParentTag(String),

    #[error("no supported language tags found under '{0}' (e.g., 'Spanish Language', 'Japanese Language')")]
    NoLanguageTags(String),

    #[error("failed to query tags: {0}")]
    Tags(#[source] HostError),

    #[error("failed to find scenes: {0}")]
    Discovery(#[source] HostError),
}
