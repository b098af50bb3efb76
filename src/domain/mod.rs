//! Domain Layer - 领域层
//!
//! 包含:
//! - Task Context: 字幕任务状态机与阶段权重
//! - Subtitle Context: SRT 格式与文件命名
//! - 进度事件、语言表、批处理候选条目

pub mod language;
pub mod progress;
pub mod scene;
pub mod subtitle;
pub mod task;

pub use progress::{local_progress, ProgressEvent};
pub use scene::{detect_language, CaptionPresence, LanguageTag, SceneCandidate};
pub use task::{
    CaptionResult, ProgressPlan, StageWeights, TaskError, TaskRecord, TaskStage, TaskStatus,
    TranslationPath,
};
