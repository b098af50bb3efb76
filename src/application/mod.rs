//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TaskStore、TranscriptionEngine、Translator、Host 等）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - progress_bridge: 引擎结果序列到任务进度的桥接
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod progress_bridge;
pub mod queries;

// Re-exports
pub use commands::{
    BatchConfig, BatchSummary, GenerateCaption, GenerateOutcome, GenerateParams, QueueBatch,
    RemoveCaptionTask, StartCaptionTask, StartCaptionTaskResponse,
    // Handlers
    handlers::{
        GenerateCaptionHandler, PollConfig, QueueBatchHandler, RemoveCaptionTaskHandler,
        StartCaptionTaskHandler,
    },
};

pub use error::{ApplicationError, BatchError, GenerateError};

pub use ports::{
    AudioExtractorPort, CaptionJob, CaptionServicePort, CaptionStorePort, HostPort,
    ProgressEventPort, ProgressSinkPort, TaskStorePort, TranscriptionEnginePort, TranslatorPort,
};

pub use progress_bridge::{ProgressBridge, Transcript};

pub use queries::{
    GetTaskResult, GetTaskStatus, ListTasks,
    // Handlers
    handlers::{
        GetTaskResultHandler, GetTaskStatusHandler, ListTasksHandler, TaskResultView,
        TaskStatusView,
    },
};
