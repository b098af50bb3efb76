//! Task Query Handlers

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::TaskStorePort;
use crate::application::queries::{GetTaskResult, GetTaskStatus, ListTasks};
use crate::domain::{CaptionResult, TaskRecord, TaskStatus};

// ============================================================================
// Response DTOs
// ============================================================================

/// 任务状态视图
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusView {
    pub task_id: String,
    pub status: TaskStatus,
    pub stage: Option<String>,
    pub progress: f64,
    pub timestamp: f64,
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CaptionResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskRecord> for TaskStatusView {
    fn from(record: TaskRecord) -> Self {
        Self {
            task_id: record.id,
            status: record.status,
            stage: record.stage.map(|s| s.as_str().to_string()),
            progress: record.progress,
            timestamp: record.timestamp,
            duration: record.duration,
            error: record.error,
            result: record.result,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// 结果查询的三种情况（不存在时返回 NotFound 错误）
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResultView {
    Ready(CaptionResult),
    Pending { status: TaskStatus, progress: f64 },
    Failed(String),
}

// ============================================================================
// Handlers
// ============================================================================

/// GetTaskStatus Handler
pub struct GetTaskStatusHandler {
    task_store: Arc<dyn TaskStorePort>,
}

impl GetTaskStatusHandler {
    pub fn new(task_store: Arc<dyn TaskStorePort>) -> Self {
        Self { task_store }
    }

    pub fn handle(&self, query: GetTaskStatus) -> Result<TaskStatusView, ApplicationError> {
        let task = self
            .task_store
            .poll(&query.task_id)
            .ok_or_else(|| ApplicationError::not_found("Task", &query.task_id))?;
        Ok(TaskStatusView::from(task))
    }
}

/// GetTaskResult Handler
pub struct GetTaskResultHandler {
    task_store: Arc<dyn TaskStorePort>,
}

impl GetTaskResultHandler {
    pub fn new(task_store: Arc<dyn TaskStorePort>) -> Self {
        Self { task_store }
    }

    pub fn handle(&self, query: GetTaskResult) -> Result<TaskResultView, ApplicationError> {
        let task = self
            .task_store
            .poll(&query.task_id)
            .ok_or_else(|| ApplicationError::not_found("Task", &query.task_id))?;

        Ok(match (task.status, task.result) {
            (TaskStatus::Completed, Some(result)) => TaskResultView::Ready(result),
            (TaskStatus::Failed, _) => {
                TaskResultView::Failed(task.error.unwrap_or_else(|| "unknown error".to_string()))
            }
            (status, _) => TaskResultView::Pending {
                status,
                progress: task.progress,
            },
        })
    }
}

/// ListTasks Handler
pub struct ListTasksHandler {
    task_store: Arc<dyn TaskStorePort>,
}

impl ListTasksHandler {
    pub fn new(task_store: Arc<dyn TaskStorePort>) -> Self {
        Self { task_store }
    }

    pub fn handle(&self, _query: ListTasks) -> Vec<TaskStatusView> {
        let mut tasks = self.task_store.list();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.into_iter().map(TaskStatusView::from).collect()
    }
}
