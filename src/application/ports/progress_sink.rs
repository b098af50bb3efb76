//! Progress Sink Port - 外部任务进度上报

/// 进度上报目标（宿主任务界面、日志等）
pub trait ProgressSinkPort: Send + Sync {
    /// 上报总体进度 [0, 1]
    fn progress(&self, fraction: f64);

    /// 上报阶段变化
    fn stage(&self, stage: &str, fraction: f64);
}
