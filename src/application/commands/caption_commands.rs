//! Caption Commands - 字幕任务命令

use serde::Serialize;

use crate::domain::TaskStatus;

/// 启动字幕任务命令
#[derive(Debug, Clone)]
pub struct StartCaptionTask {
    pub video_path: String,
    /// 源语言，空字符串表示自动识别
    pub language: String,
    pub translate_to: Option<String>,
}

/// 启动字幕任务响应
#[derive(Debug, Clone, Serialize)]
pub struct StartCaptionTaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
}

/// 删除任务命令
#[derive(Debug, Clone)]
pub struct RemoveCaptionTask {
    pub task_id: String,
}
