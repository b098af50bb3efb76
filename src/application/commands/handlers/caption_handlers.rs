//! Caption Command Handlers

use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::caption_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{CaptionJob, CaptionStorePort, ProgressEventPort, TaskStorePort};
use crate::domain::language;

/// 校验语言参数：源语言可为空（自动识别），非空时必须受支持
pub fn validate_languages(source: &str, target: Option<&str>) -> Result<(), ApplicationError> {
    if !source.is_empty() && !language::is_supported(source) {
        return Err(ApplicationError::validation(format!(
            "Unsupported language: {} (supported: {})",
            source,
            language::SUPPORTED_LANGUAGES.join(", ")
        )));
    }
    if let Some(target) = target.filter(|t| !t.is_empty()) {
        if !language::is_supported(target) {
            return Err(ApplicationError::validation(format!(
                "Unsupported translation target: {} (supported: {})",
                target,
                language::SUPPORTED_LANGUAGES.join(", ")
            )));
        }
    }
    Ok(())
}

/// StartCaptionTask Handler - 校验并投递字幕任务
pub struct StartCaptionTaskHandler {
    task_store: Arc<dyn TaskStorePort>,
    caption_store: Arc<dyn CaptionStorePort>,
}

impl StartCaptionTaskHandler {
    pub fn new(task_store: Arc<dyn TaskStorePort>, caption_store: Arc<dyn CaptionStorePort>) -> Self {
        Self {
            task_store,
            caption_store,
        }
    }

    pub async fn handle(&self, cmd: StartCaptionTask) -> Result<StartCaptionTaskResponse, ApplicationError> {
        let video_path = cmd.video_path.trim();
        if video_path.is_empty() {
            return Err(ApplicationError::validation("video_path is required"));
        }
        let source = cmd.language.trim().to_lowercase();
        let target = cmd
            .translate_to
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        validate_languages(&source, target.as_deref())?;

        let media_path = PathBuf::from(video_path);
        self.caption_store.check_media(&media_path).await?;

        let job = CaptionJob {
            task_id: Uuid::new_v4().to_string(),
            media_path,
            source_language: source,
            target_language: target,
        };

        tracing::info!(
            task_id = %job.task_id,
            video_path = %job.media_path.display(),
            language = %job.source_language,
            translate_to = ?job.target_language,
            "Submitting caption task"
        );

        let record = self.task_store.submit(job)?;

        Ok(StartCaptionTaskResponse {
            task_id: record.id,
            status: record.status,
        })
    }
}

/// RemoveCaptionTask Handler - 删除已结束的任务
pub struct RemoveCaptionTaskHandler {
    task_store: Arc<dyn TaskStorePort>,
    events: Arc<dyn ProgressEventPort>,
}

impl RemoveCaptionTaskHandler {
    pub fn new(task_store: Arc<dyn TaskStorePort>, events: Arc<dyn ProgressEventPort>) -> Self {
        Self { task_store, events }
    }

    pub fn handle(&self, cmd: RemoveCaptionTask) -> Result<(), ApplicationError> {
        let task = self
            .task_store
            .get(&cmd.task_id)
            .ok_or_else(|| ApplicationError::not_found("Task", &cmd.task_id))?;
        if !task.is_terminal() {
            return Err(ApplicationError::invalid_state(format!(
                "Task {} is still {}",
                cmd.task_id, task.status
            )));
        }
        self.task_store.remove(&cmd.task_id);
        self.events.unregister(&cmd.task_id);
        tracing::debug!(task_id = %cmd.task_id, "Task removed");
        Ok(())
    }
}
