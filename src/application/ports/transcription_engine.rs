//! Transcription Engine Port - 语音识别引擎抽象
//!
//! 引擎返回一个惰性、只能消费一次的有限结果序列，附带媒体时长。
//! 所有识别工作都发生在消费序列的过程中。

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::path::PathBuf;
use thiserror::Error;

/// 引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// 序列在终止记录之前中断
    #[error("Stream ended before a terminal record")]
    Truncated,

    #[error("Transcription produced no results")]
    EmptyTranscript,

    #[error("IO error: {0}")]
    IoError(String),
}

/// 引擎模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Transcribe,
    /// 识别同时翻译为规范语言
    Translate,
}

impl EngineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineMode::Transcribe => "transcribe",
            EngineMode::Translate => "translate",
        }
    }
}

/// 识别请求
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    /// 提供时引擎以流式进度返回，否则一次性返回
    pub task_id: Option<String>,
    pub audio_path: PathBuf,
    /// None 表示自动识别
    pub language: Option<String>,
    pub mode: EngineMode,
}

/// 带时间的结果单元
#[derive(Debug, Clone, PartialEq)]
pub struct TimedUnit {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// 序列结束时的汇总信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSummary {
    /// 引擎自带的完整字幕；为空时由单元拼装
    pub srt_content: Option<String>,
    pub language: Option<String>,
    pub language_probability: Option<f64>,
}

/// 序列元素
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Unit(TimedUnit),
    Finished(EngineSummary),
}

pub type EngineEventStream = BoxStream<'static, Result<EngineEvent, EngineError>>;

/// 识别结果序列
pub struct UnitStream {
    /// 媒体总时长（秒），未知时为 None
    pub duration: Option<f64>,
    pub events: EngineEventStream,
}

impl std::fmt::Debug for UnitStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitStream")
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

/// Transcription Engine Port
#[async_trait]
pub trait TranscriptionEnginePort: Send + Sync {
    /// 开始识别，返回惰性结果序列
    async fn transcribe(&self, request: TranscribeRequest) -> Result<UnitStream, EngineError>;

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
