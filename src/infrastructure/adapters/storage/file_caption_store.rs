//! File Caption Store - 文件系统字幕存取
//!
//! 实现 CaptionStorePort trait，字幕与媒体文件放在同一目录

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{ArtifactError, CaptionStorePort};
use crate::domain::subtitle::{artifact_path, media_stem, CaptionFileMatcher};

/// 文件系统字幕存储
#[derive(Debug, Clone, Default)]
pub struct FileCaptionStore;

impl FileCaptionStore {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(path: &Path, e: std::io::Error) -> ArtifactError {
    match e.kind() {
        std::io::ErrorKind::NotFound => ArtifactError::NotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => {
            ArtifactError::PermissionDenied(path.display().to_string())
        }
        _ => ArtifactError::IoError(format!("{}: {}", path.display(), e)),
    }
}

#[async_trait]
impl CaptionStorePort for FileCaptionStore {
    async fn check_media(&self, media_path: &Path) -> Result<(), ArtifactError> {
        let metadata = fs::metadata(media_path)
            .await
            .map_err(|e| io_error(media_path, e))?;
        if !metadata.is_file() {
            return Err(ArtifactError::NotAFile(media_path.display().to_string()));
        }
        // 能打开才算可读
        fs::File::open(media_path)
            .await
            .map_err(|e| io_error(media_path, e))?;

        tracing::debug!(path = %media_path.display(), "Media file validated");
        Ok(())
    }

    async fn find_existing(&self, media_path: &Path, language: &str) -> Result<Option<PathBuf>, ArtifactError> {
        let dir = match media_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let matcher = CaptionFileMatcher::new(&media_stem(media_path), language)
            .map_err(|e| ArtifactError::InvalidPattern(e.to_string()))?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Cannot search for existing captions");
                return Ok(None);
            }
        };

        let mut found: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ArtifactError::IoError(e.to_string()))?
        {
            let name = entry.file_name();
            if matcher.matches(&name.to_string_lossy()) {
                found.push(entry.path());
            }
        }
        found.sort();

        let existing = found.into_iter().next();
        match existing.as_ref() {
            Some(path) => tracing::info!(path = %path.display(), "Found existing caption file"),
            None => tracing::debug!(
                media = %media_path.display(),
                language = %language,
                "No existing caption file"
            ),
        }
        Ok(existing)
    }

    async fn read(&self, path: &Path) -> Result<String, ArtifactError> {
        fs::read_to_string(path).await.map_err(|e| io_error(path, e))
    }

    async fn write(&self, media_path: &Path, language: &str, content: &str) -> Result<PathBuf, ArtifactError> {
        let path = artifact_path(media_path, language);
        fs::write(&path, content)
            .await
            .map_err(|e| io_error(&path, e))?;

        tracing::info!(path = %path.display(), size = content.len(), "Caption file saved");
        Ok(path)
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_media() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("movie.mp4");
        let store = FileCaptionStore::new();

        assert!(matches!(
            store.check_media(&media).await,
            Err(ArtifactError::NotFound(_))
        ));
        assert!(matches!(
            store.check_media(dir.path()).await,
            Err(ArtifactError::NotAFile(_))
        ));

        std::fs::write(&media, b"x").unwrap();
        assert!(store.check_media(&media).await.is_ok());
    }

    #[tokio::test]
    async fn test_write_then_find() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("movie.mp4");
        std::fs::write(&media, b"x").unwrap();
        let store = FileCaptionStore::new();

        assert_eq!(store.find_existing(&media, "en").await.unwrap(), None);

        let path = store.write(&media, "en", "1\n").await.unwrap();
        assert_eq!(path, dir.path().join("movie.en.srt"));
        assert!(store.exists(&path).await);
        assert_eq!(store.find_existing(&media, "en").await.unwrap(), Some(path.clone()));
        assert_eq!(store.read(&path).await.unwrap(), "1\n");
        assert_eq!(store.find_existing(&media, "ja").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_tagged_variant() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("movie.mkv");
        std::fs::write(dir.path().join("movie.es.forced.srt"), b"x").unwrap();

        let found = FileCaptionStore::new().find_existing(&media, "es").await.unwrap();
        assert_eq!(found, Some(dir.path().join("movie.es.forced.srt")));
    }
}
