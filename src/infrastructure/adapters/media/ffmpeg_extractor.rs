//! FFmpeg Extractor - 调用 ffmpeg 提取 16kHz 单声道 WAV
//!
//! 实现 AudioExtractorPort trait，输出写入临时目录，由调用方删除

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::application::ports::{AudioExtractorPort, ExtractError, ExtractedAudio};

const SAMPLE_RATE: u32 = 16_000;
const CHANNELS: u32 = 1;
const BYTES_PER_SAMPLE: u32 = 2;
const WAV_HEADER_LEN: u64 = 44;

/// FFmpeg 提取器配置
#[derive(Debug, Clone)]
pub struct FfmpegExtractorConfig {
    /// ffmpeg 可执行文件
    pub binary: String,
    /// 临时音频目录
    pub temp_dir: PathBuf,
}

impl Default for FfmpegExtractorConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            temp_dir: std::env::temp_dir().join("auto-caption"),
        }
    }
}

pub struct FfmpegExtractor {
    config: FfmpegExtractorConfig,
}

impl FfmpegExtractor {
    pub fn new(config: FfmpegExtractorConfig) -> Self {
        Self { config }
    }

    fn output_path(&self, task_id: &str) -> PathBuf {
        self.config.temp_dir.join(format!("{}.wav", task_id))
    }
}

/// 由 PCM WAV 文件大小推算时长（秒）
pub fn wav_duration(file_len: u64) -> Option<f64> {
    let data_len = file_len.checked_sub(WAV_HEADER_LEN)?;
    if data_len == 0 {
        return None;
    }
    let bytes_per_sec = (SAMPLE_RATE * CHANNELS * BYTES_PER_SAMPLE) as f64;
    Some(data_len as f64 / bytes_per_sec)
}

#[async_trait]
impl AudioExtractorPort for FfmpegExtractor {
    async fn extract(&self, media_path: &Path, task_id: &str) -> Result<ExtractedAudio, ExtractError> {
        tokio::fs::create_dir_all(&self.config.temp_dir)
            .await
            .map_err(|e| ExtractError::IoError(format!("{}: {}", self.config.temp_dir.display(), e)))?;

        let output_path = self.output_path(task_id);
        tracing::info!(
            task_id = %task_id,
            input = %media_path.display(),
            output = %output_path.display(),
            "Extracting audio"
        );

        let output = Command::new(&self.config.binary)
            .arg("-i")
            .arg(media_path)
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg(SAMPLE_RATE.to_string())
            .arg("-ac")
            .arg(CHANNELS.to_string())
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg(&output_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ExtractError::Unavailable(format!("{} not found", self.config.binary))
                }
                _ => ExtractError::IoError(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(ExtractError::Failed(format!("ffmpeg failed: {}", stderr.trim())));
        }

        let metadata = tokio::fs::metadata(&output_path)
            .await
            .map_err(|e| ExtractError::IoError(e.to_string()))?;
        let duration = wav_duration(metadata.len());

        tracing::info!(task_id = %task_id, duration = ?duration, "Audio extracted");

        Ok(ExtractedAudio {
            path: output_path,
            duration,
        })
    }
}
