//! Batch Handler - 发现缺字幕的条目并逐个投递生成任务
//!
//! 流程：
//! 1. 解析父标签及其可识别的语言子标签（缺失时整批失败）
//! 2. 查询带有这些标签的条目
//! 3. 已有字幕的跳过；文件在但未索引的走修复路径
//! 4. 按批大小截断后顺序投递，单条失败只计数

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::application::commands::batch_commands::*;
use crate::application::error::BatchError;
use crate::application::ports::{CaptionStorePort, EnqueueRequest, HostPort, HostScene};
use crate::domain::subtitle::artifact_path;
use crate::domain::{detect_language, language, CaptionPresence, LanguageTag, SceneCandidate};

/// QueueBatch Handler
pub struct QueueBatchHandler {
    host: Arc<dyn HostPort>,
    captions: Arc<dyn CaptionStorePort>,
    config: BatchConfig,
}

impl QueueBatchHandler {
    pub fn new(host: Arc<dyn HostPort>, captions: Arc<dyn CaptionStorePort>, config: BatchConfig) -> Self {
        Self {
            host,
            captions,
            config,
        }
    }

    pub async fn handle(&self, cmd: QueueBatch) -> Result<BatchSummary, BatchError> {
        let max_batch_size = cmd.max_batch_size.unwrap_or(self.config.max_batch_size);

        let language_tags = self.resolve_language_tags().await?;
        tracing::debug!(
            tags = ?language_tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "Resolved language tags"
        );

        let tag_ids: Vec<String> = language_tags.iter().map(|t| t.tag_id.clone()).collect();
        let scenes = self
            .host
            .find_scenes_by_tags(&tag_ids, self.config.page_size)
            .await
            .map_err(BatchError::Discovery)?;

        let mut summary = BatchSummary {
            discovered: scenes.len(),
            ..Default::default()
        };
        tracing::info!(count = scenes.len(), "Found scenes with language tags");

        let mut to_process = Vec::new();
        for scene in &scenes {
            let candidate = self.inspect(scene, &language_tags).await;
            match candidate.caption_presence() {
                CaptionPresence::Missing => to_process.push(candidate),
                CaptionPresence::NeedsRepair => {
                    self.repair(&candidate).await;
                    summary.repaired += 1;
                }
                CaptionPresence::Present | CaptionPresence::MetadataOnly => summary.filtered += 1,
            }
        }

        summary.eligible = to_process.len();
        tracing::info!(count = to_process.len(), "Filtered to scenes without captions");

        if to_process.len() > max_batch_size {
            summary.deferred = to_process.len() - max_batch_size;
            tracing::warn!(
                eligible = to_process.len(),
                max_batch_size,
                deferred = summary.deferred,
                "Limiting batch size, remaining scenes deferred to next run"
            );
            to_process.truncate(max_batch_size);
        }

        let mut submitted_ids: HashSet<String> = HashSet::new();
        for (i, candidate) in to_process.iter().enumerate() {
            if i > 0 && !self.config.submit_interval.is_zero() {
                tokio::time::sleep(self.config.submit_interval).await;
            }

            let Some(media_path) = candidate.media_path.as_deref() else {
                tracing::warn!(
                    scene_id = %candidate.id,
                    title = %candidate.display_title(),
                    "No video files found, skipping"
                );
                summary.failed += 1;
                continue;
            };

            if self.config.dedupe_within_run && !submitted_ids.insert(candidate.id.clone()) {
                tracing::debug!(scene_id = %candidate.id, "Scene already submitted in this run");
                continue;
            }

            match self.host.enqueue_task(self.enqueue_request(candidate, media_path)).await {
                Ok(job_id) => {
                    tracing::info!(
                        scene_id = %candidate.id,
                        title = %candidate.display_title(),
                        language = %candidate.detected_language,
                        job_id = %job_id,
                        "Queued for caption generation"
                    );
                    summary.queued += 1;
                }
                Err(e) => {
                    tracing::error!(
                        scene_id = %candidate.id,
                        title = %candidate.display_title(),
                        error = %e,
                        "Failed to queue task"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            discovered = summary.discovered,
            filtered = summary.filtered,
            repaired = summary.repaired,
            queued = summary.queued,
            failed = summary.failed,
            deferred = summary.deferred,
            "Batch processing complete"
        );

        Ok(summary)
    }

    async fn resolve_language_tags(&self) -> Result<Vec<LanguageTag>, BatchError> {
        let tags = self.host.all_tags().await.map_err(BatchError::Tags)?;
        let parent = tags
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(&self.config.parent_tag))
            .ok_or_else(|| BatchError::MissingParentTag(self.config.parent_tag.clone()))?;

        let language_tags: Vec<LanguageTag> = parent
            .children
            .iter()
            .filter_map(|child| {
                language::code_for_tag(&child.name).map(|code| LanguageTag {
                    tag_id: child.id.clone(),
                    name: child.name.clone(),
                    code: code.to_string(),
                })
            })
            .collect();

        if language_tags.is_empty() {
            return Err(BatchError::NoLanguageTags(self.config.parent_tag.clone()));
        }
        Ok(language_tags)
    }

    async fn inspect(&self, scene: &HostScene, language_tags: &[LanguageTag]) -> SceneCandidate {
        let media_path = scene.file_paths.first().cloned();
        let tag_ids: Vec<String> = scene.tags.iter().map(|t| t.id.clone()).collect();

        let existing_caption_metadata = !scene.caption_languages.is_empty()
            && scene.caption_path.as_deref().is_some_and(|p| !p.is_empty());
        let existing_caption_file = match media_path.as_deref() {
            Some(path) => {
                let srt = artifact_path(Path::new(path), &self.config.translate_to);
                self.captions.exists(&srt).await
            }
            None => false,
        };

        SceneCandidate {
            id: scene.id.clone(),
            title: scene.title.clone(),
            media_path,
            detected_language: detect_language(&tag_ids, language_tags),
            tag_ids,
            existing_caption_metadata,
            existing_caption_file,
        }
    }

    /// 文件已存在但宿主未索引：触发扫描，成功后补标签
    async fn repair(&self, candidate: &SceneCandidate) {
        let Some(media_path) = candidate.media_path.as_deref() else {
            return;
        };
        let srt = artifact_path(Path::new(media_path), &self.config.translate_to)
            .display()
            .to_string();

        tracing::info!(scene_id = %candidate.id, caption_path = %srt, "Caption file not indexed, triggering scan");
        if let Err(e) = self.host.scan_metadata(&[srt]).await {
            tracing::warn!(scene_id = %candidate.id, error = %e, "Failed to trigger metadata scan");
            return;
        }
        if let Err(e) = self.host.add_label(&candidate.id, &self.config.subtitled_label).await {
            tracing::warn!(scene_id = %candidate.id, error = %e, "Failed to add label");
        }
    }

    fn enqueue_request(&self, candidate: &SceneCandidate, media_path: &str) -> EnqueueRequest {
        let mut args = Map::new();
        args.insert("mode".to_string(), Value::from("generate"));
        args.insert("scene_id".to_string(), Value::from(candidate.id.clone()));
        args.insert("video_path".to_string(), Value::from(media_path));
        args.insert("language".to_string(), Value::from(candidate.detected_language.clone()));
        args.insert("translate_to".to_string(), Value::from(self.config.translate_to.clone()));
        args.insert("service_url".to_string(), Value::from(self.config.service_url.clone()));
        args.insert("cooldown_seconds".to_string(), Value::from(self.config.cooldown_secs));

        EnqueueRequest {
            task_name: self.config.task_name.clone(),
            description: format!("Generating caption for {}", media_path),
            args,
        }
    }
}
