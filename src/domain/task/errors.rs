//! Task Context - Errors

use thiserror::Error;

use super::TaskStatus;

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("任务不存在: {0}")]
    NotFound(String),

    #[error("任务已存在: {0}")]
    AlreadyExists(String),

    #[error("非法状态迁移: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("任务已结束: {0}")]
    AlreadyTerminal(String),
}
