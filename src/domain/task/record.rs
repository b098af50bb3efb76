//! Task Context - TaskRecord 聚合
//!
//! 单个字幕任务的状态机：queued -> running -> completed | failed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::TaskError;

/// 未完成任务允许达到的最大进度，1.0 只留给 completed
pub const RUNNING_PROGRESS_CEILING: f64 = 0.99;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    ExtractingAudio,
    Transcribing,
    Translating,
    Saving,
}

impl TaskStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStage::ExtractingAudio => "extracting_audio",
            TaskStage::Transcribing => "transcribing",
            TaskStage::Translating => "translating",
            TaskStage::Saving => "saving",
        }
    }
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 任务完成结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionResult {
    /// 生成（或复用）的字幕文件路径
    pub artifact_path: String,
    /// 是否命中已有字幕
    pub cached: bool,
    /// 二次翻译所用的后端
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_backend: Option<String>,
}

/// 任务记录
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub status: TaskStatus,
    pub stage: Option<TaskStage>,
    pub progress: f64,
    /// 引擎已处理到的媒体时间（秒）
    pub timestamp: f64,
    /// 媒体总时长（秒），一旦确定不再变化
    pub duration: Option<f64>,
    pub result: Option<CaptionResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, duration: Option<f64>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: TaskStatus::Queued,
            stage: None,
            progress: 0.0,
            timestamp: 0.0,
            duration: duration.filter(|d| *d > 0.0),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            last_polled_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// queued -> running
    pub fn start(&mut self) -> Result<(), TaskError> {
        match self.status {
            TaskStatus::Queued => {
                self.status = TaskStatus::Running;
                self.touch();
                Ok(())
            }
            TaskStatus::Running => Ok(()),
            other => Err(TaskError::InvalidTransition {
                from: other,
                to: TaskStatus::Running,
            }),
        }
    }

    /// 进入新阶段，并写入阶段起始进度
    pub fn enter_stage(&mut self, stage: TaskStage, entry_progress: f64) -> Result<(), TaskError> {
        self.start()?;
        self.stage = Some(stage);
        self.raise_progress(entry_progress);
        self.touch();
        Ok(())
    }

    /// 记录转写进度；进度与时间戳都只增不减
    pub fn advance(&mut self, progress: f64, timestamp: f64) -> Result<(), TaskError> {
        if self.is_terminal() {
            return Err(TaskError::AlreadyTerminal(self.id.clone()));
        }
        self.raise_progress(progress);
        if timestamp.is_finite() && timestamp > self.timestamp {
            self.timestamp = timestamp;
        }
        self.touch();
        Ok(())
    }

    /// 首次得知媒体时长
    pub fn set_duration(&mut self, duration: f64) {
        if self.duration.is_none() && duration.is_finite() && duration > 0.0 {
            self.duration = Some(duration);
            self.touch();
        }
    }

    pub fn complete(&mut self, result: CaptionResult) -> Result<(), TaskError> {
        if self.is_terminal() {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to: TaskStatus::Completed,
            });
        }
        self.status = TaskStatus::Completed;
        self.progress = 1.0;
        self.result = Some(result);
        self.touch();
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TaskError> {
        if self.is_terminal() {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to: TaskStatus::Failed,
            });
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.touch();
        Ok(())
    }

    fn raise_progress(&mut self, progress: f64) {
        if !progress.is_finite() {
            return;
        }
        let clamped = progress.clamp(0.0, RUNNING_PROGRESS_CEILING);
        if clamped > self.progress {
            self.progress = clamped;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
