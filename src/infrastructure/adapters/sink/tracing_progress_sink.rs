//! Tracing Progress Sink - 以日志形式上报外部任务进度

use std::sync::Mutex;

use crate::application::ports::ProgressSinkPort;

/// 进度日志；只有进度前进到新的百分点或阶段变化时才输出
#[derive(Debug, Default)]
pub struct TracingProgressSink {
    last: Mutex<(Option<u32>, Option<String>)>,
}

impl TracingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSinkPort for TracingProgressSink {
    fn progress(&self, fraction: f64) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        if last.0 == Some(percent) {
            return;
        }
        last.0 = Some(percent);
        tracing::info!(progress = fraction, percent, "Caption task progress");
    }

    fn stage(&self, stage: &str, fraction: f64) {
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        if last.1.as_deref() == Some(stage) {
            return;
        }
        last.1 = Some(stage.to_string());
        tracing::info!(stage = %stage, progress = fraction, "Caption task stage");
    }
}
