//! Audio Extractor Port - 从媒体文件提取音轨

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Extractor not available: {0}")]
    Unavailable(String),

    #[error("Extraction failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 提取出的音频（临时文件，由调用方负责清理）
#[derive(Debug, Clone)]
pub struct ExtractedAudio {
    pub path: PathBuf,
    /// 音频时长（秒）
    pub duration: Option<f64>,
}

#[async_trait]
pub trait AudioExtractorPort: Send + Sync {
    /// 提取为 16kHz 单声道 PCM WAV
    async fn extract(&self, media_path: &Path, task_id: &str) -> Result<ExtractedAudio, ExtractError>;
}
