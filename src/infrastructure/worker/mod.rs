//! Worker Layer - Background Task Processing
//!
//! 实现 CaptionWorker，按阶段处理字幕任务

mod caption_worker;

pub use caption_worker::{CaptionWorker, CaptionWorkerConfig, PipelineError};
