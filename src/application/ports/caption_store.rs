//! Caption Store Port - 字幕文件存取
//!
//! 字幕与媒体文件放在同一目录下，命名为 `<stem>.<lang>.srt`

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Media file not found: {0}")]
    NotFound(String),

    #[error("Path is not a file: {0}")]
    NotAFile(String),

    #[error("Media file is not readable: {0}")]
    PermissionDenied(String),

    #[error("Invalid name pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    IoError(String),
}

#[async_trait]
pub trait CaptionStorePort: Send + Sync {
    /// 校验媒体文件存在、是普通文件且可读
    async fn check_media(&self, media_path: &Path) -> Result<(), ArtifactError>;

    /// 查找媒体旁已有的对应语言字幕
    async fn find_existing(&self, media_path: &Path, language: &str) -> Result<Option<PathBuf>, ArtifactError>;

    async fn read(&self, path: &Path) -> Result<String, ArtifactError>;

    /// 写入字幕，返回文件路径
    async fn write(&self, media_path: &Path, language: &str, content: &str) -> Result<PathBuf, ArtifactError>;

    async fn exists(&self, path: &Path) -> bool;
}
