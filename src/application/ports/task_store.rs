//! Task Store Port - 字幕任务状态存储
//!
//! 定义任务状态存储的抽象接口，具体实现在 infrastructure/memory 层。
//! 存储是任务状态的唯一来源；只有处理该任务的 worker 写入，轮询方并发读取。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{CaptionResult, TaskError, TaskRecord, TaskStage};

/// Task Store 错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task already exists: {0}")]
    AlreadyExists(String),

    #[error("Task queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error(transparent)]
    Transition(#[from] TaskError),
}

/// 待执行的字幕任务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionJob {
    pub task_id: String,
    pub media_path: PathBuf,
    /// 空字符串表示自动识别
    pub source_language: String,
    pub target_language: Option<String>,
}

/// Task Store Port
pub trait TaskStorePort: Send + Sync {
    /// 创建 queued 记录并将任务投递到执行队列
    fn submit(&self, job: CaptionJob) -> Result<TaskRecord, StoreError>;

    /// 仅创建记录（不投递）
    fn create(&self, task_id: &str, duration: Option<f64>) -> Result<TaskRecord, StoreError>;

    /// 进入新阶段并写入阶段起始进度
    fn enter_stage(&self, task_id: &str, stage: TaskStage, progress: f64) -> Result<(), StoreError>;

    /// 记录媒体总时长
    fn set_duration(&self, task_id: &str, duration: f64);

    /// 更新进度；任务不存在时静默忽略
    fn update_progress(&self, task_id: &str, progress: f64, timestamp: f64);

    fn complete(&self, task_id: &str, result: CaptionResult) -> Result<(), StoreError>;

    fn fail(&self, task_id: &str, error: String) -> Result<(), StoreError>;

    fn get(&self, task_id: &str) -> Option<TaskRecord>;

    /// 读取并记录一次轮询（轮询中的任务不会被淘汰）
    fn poll(&self, task_id: &str) -> Option<TaskRecord>;

    fn list(&self) -> Vec<TaskRecord>;

    fn remove(&self, task_id: &str) -> bool;
}
