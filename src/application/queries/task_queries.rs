//! Task Queries - 字幕任务查询

/// 查询任务状态（记录一次轮询）
#[derive(Debug, Clone)]
pub struct GetTaskStatus {
    pub task_id: String,
}

/// 查询任务结果
#[derive(Debug, Clone)]
pub struct GetTaskResult {
    pub task_id: String,
}

/// 列出所有任务
#[derive(Debug, Clone)]
pub struct ListTasks;
