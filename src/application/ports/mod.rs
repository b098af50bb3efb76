//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_extractor;
mod caption_service;
mod caption_store;
mod host;
mod progress_events;
mod progress_sink;
mod task_store;
mod transcription_engine;
mod translator;

pub use audio_extractor::{AudioExtractorPort, ExtractError, ExtractedAudio};
pub use caption_service::{
    CaptionServiceError, CaptionServicePort, StartTaskRequest, StartTaskResponse, TaskStatusReport,
};
pub use caption_store::{ArtifactError, CaptionStorePort};
pub use host::{
    EnqueueRequest, HostError, HostPort, HostScene, HostTag, HostTagRef,
};
pub use progress_events::ProgressEventPort;
pub use progress_sink::ProgressSinkPort;
pub use task_store::{CaptionJob, StoreError, TaskStorePort};
pub use transcription_engine::{
    EngineError, EngineEvent, EngineEventStream, EngineMode, EngineSummary, TimedUnit,
    TranscribeRequest, TranscriptionEnginePort, UnitStream,
};
pub use translator::{TranslateError, TranslatorPort};
