//! Progress Event Port - 进度事件发布

use crate::domain::ProgressEvent;

/// 任务进度事件的发布目标，具体实现在 infrastructure/events 层
pub trait ProgressEventPort: Send + Sync {
    fn publish(&self, task_id: &str, event: ProgressEvent);

    /// 任务被删除后释放其事件通道
    fn unregister(&self, task_id: &str);
}
