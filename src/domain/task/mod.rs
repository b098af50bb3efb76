//! Task Context - 字幕任务限界上下文
//!
//! 职责:
//! - 任务状态机（queued / running / completed / failed）
//! - 阶段与阶段权重
//! - 进度单调性约束

mod errors;
mod record;
mod weights;

pub use errors::TaskError;
pub use record::{
    CaptionResult, TaskRecord, TaskStage, TaskStatus, RUNNING_PROGRESS_CEILING,
};
pub use weights::{ProgressPlan, StageWeights, TranslationPath};
