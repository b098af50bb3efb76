//! Caption Worker - 后台字幕任务处理
//!
//! 从队列消费任务，按阶段执行：提取音频 -> 转写 -> (二次翻译) -> 保存

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};

use crate::application::ports::{
    ArtifactError, AudioExtractorPort, CaptionJob, CaptionStorePort, EngineError, EngineMode,
    ExtractError, ProgressEventPort, StoreError, TaskStorePort, TranscribeRequest,
    TranscriptionEnginePort, TranslateError, TranslatorPort,
};
use crate::application::{ProgressBridge, Transcript};
use crate::domain::subtitle::{align_lines, render_srt, SubtitleCue};
use crate::domain::{
    CaptionResult, ProgressEvent, ProgressPlan, StageWeights, TaskStage, TranslationPath,
};
use crate::infrastructure::events::EventPublisher;

/// 单个任务的流水线错误，均为致命错误
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("media check failed: {0}")]
    Media(#[source] ArtifactError),

    #[error("audio extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("transcription failed: {0}")]
    Engine(#[from] EngineError),

    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),

    #[error("no translation service configured for {from} -> {to}")]
    TranslatorUnavailable { from: String, to: String },

    #[error("failed to save subtitles: {0}")]
    Persist(#[source] ArtifactError),

    #[error("task store error: {0}")]
    Store(#[from] StoreError),
}

/// Worker 配置
#[derive(Debug, Clone)]
pub struct CaptionWorkerConfig {
    /// 最大并发任务数
    pub max_concurrent: usize,
    pub secondary_weights: StageWeights,
    pub engine_weights: StageWeights,
    /// 引擎可直接翻译到的语言
    pub canonical_language: String,
}

impl Default for CaptionWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            secondary_weights: StageWeights::SECONDARY,
            engine_weights: StageWeights::ENGINE_TRANSLATED,
            canonical_language: "en".to_string(),
        }
    }
}

/// 任务处理所需的全部协作者
#[derive(Clone)]
struct Pipeline {
    config: Arc<CaptionWorkerConfig>,
    task_store: Arc<dyn TaskStorePort>,
    extractor: Arc<dyn AudioExtractorPort>,
    engine: Arc<dyn TranscriptionEnginePort>,
    translator: Option<Arc<dyn TranslatorPort>>,
    caption_store: Arc<dyn CaptionStorePort>,
    events: Arc<EventPublisher>,
}

/// 字幕 Worker
pub struct CaptionWorker {
    queue_receiver: mpsc::Receiver<CaptionJob>,
    pipeline: Pipeline,
}

impl CaptionWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: CaptionWorkerConfig,
        queue_receiver: mpsc::Receiver<CaptionJob>,
        task_store: Arc<dyn TaskStorePort>,
        extractor: Arc<dyn AudioExtractorPort>,
        engine: Arc<dyn TranscriptionEnginePort>,
        translator: Option<Arc<dyn TranslatorPort>>,
        caption_store: Arc<dyn CaptionStorePort>,
        events: Arc<EventPublisher>,
    ) -> Self {
        Self {
            queue_receiver,
            pipeline: Pipeline {
                config: Arc::new(config),
                task_store,
                extractor,
                engine,
                translator,
                caption_store,
                events,
            },
        }
    }

    /// 启动 Worker，队列关闭后返回
    pub async fn run(mut self) {
        let max_concurrent = self.pipeline.config.max_concurrent.max(1);
        tracing::info!(max_concurrent = max_concurrent, "CaptionWorker started");

        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        while let Some(job) = self.queue_receiver.recv().await {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::error!(task_id = %job.task_id, "Failed to acquire semaphore permit");
                continue;
            };

            let pipeline = self.pipeline.clone();
            tokio::spawn(async move {
                let _permit = permit;
                pipeline.process(job).await;
            });
        }

        tracing::info!("CaptionWorker stopped");
    }
}

impl Pipeline {
    /// 处理单个任务，保证恰好一次终止转换
    async fn process(&self, job: CaptionJob) {
        let task_id = job.task_id.clone();
        self.events.register(&task_id);
        tracing::info!(
            task_id = %task_id,
            media = %job.media_path.display(),
            source = %job.source_language,
            target = ?job.target_language,
            "Processing caption task"
        );

        match self.run_stages(&job).await {
            Ok(result) => {
                tracing::info!(
                    task_id = %task_id,
                    artifact = %result.artifact_path,
                    cached = result.cached,
                    "Caption task completed"
                );
                if let Err(e) = self.task_store.complete(&task_id, result) {
                    tracing::error!(task_id = %task_id, error = %e, "Failed to complete task");
                }
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Caption task failed");
                self.events.publish(
                    &task_id,
                    ProgressEvent::Error {
                        error: e.to_string(),
                    },
                );
                if let Err(store_err) = self.task_store.fail(&task_id, e.to_string()) {
                    tracing::error!(task_id = %task_id, error = %store_err, "Failed to mark task as failed");
                }
            }
        }
    }

    async fn run_stages(&self, job: &CaptionJob) -> Result<CaptionResult, PipelineError> {
        let task_id = job.task_id.as_str();
        let source = job.source_language.as_str();
        let target = job.target_language.as_deref().filter(|t| !t.is_empty());

        let path = TranslationPath::choose(source, target, &self.config.canonical_language);
        let plan = ProgressPlan::new(path, self.config.secondary_weights, self.config.engine_weights);

        self.task_store
            .enter_stage(task_id, TaskStage::ExtractingAudio, plan.entry(TaskStage::ExtractingAudio))?;

        if let Some(result) = self.cached_result(job).await {
            return Ok(result);
        }

        self.caption_store
            .check_media(&job.media_path)
            .await
            .map_err(PipelineError::Media)?;

        let audio = self.extractor.extract(&job.media_path, task_id).await?;
        if let Some(duration) = audio.duration {
            self.task_store.set_duration(task_id, duration);
        }

        let transcript = self.transcribe(task_id, source, path, plan, &audio.path).await;
        remove_temp_audio(task_id, &audio.path).await;
        let transcript = transcript?;

        let detected = transcript
            .language
            .clone()
            .filter(|l| !l.is_empty())
            .or_else(|| (!source.is_empty()).then(|| source.to_string()));

        let mut srt_content = transcript.srt_content.clone();
        let mut translation_backend = None;

        if path == TranslationPath::Secondary {
            self.task_store
                .enter_stage(task_id, TaskStage::Translating, plan.entry(TaskStage::Translating))?;

            let from = detected.clone().unwrap_or_else(|| self.config.canonical_language.clone());
            let to = target.unwrap_or_default();
            if from.eq_ignore_ascii_case(to) {
                tracing::info!(task_id = %task_id, language = %from, "Detected language matches target, skipping translation");
            } else {
                let translator = self.translator.as_ref().ok_or_else(|| {
                    PipelineError::TranslatorUnavailable {
                        from: from.clone(),
                        to: to.to_string(),
                    }
                })?;
                srt_content = translate_cues(translator.as_ref(), &transcript.cues, &from, to).await?;
                translation_backend = Some(translator.name().to_string());
            }
            self.task_store.update_progress(
                task_id,
                plan.overall(TaskStage::Translating, 1.0),
                transcript.duration.unwrap_or(0.0),
            );
        }

        self.task_store
            .enter_stage(task_id, TaskStage::Saving, plan.entry(TaskStage::Saving))?;

        let language = target
            .map(str::to_string)
            .or(detected)
            .unwrap_or_else(|| self.config.canonical_language.clone());
        let artifact = self
            .caption_store
            .write(&job.media_path, &language, &srt_content)
            .await
            .map_err(PipelineError::Persist)?;

        Ok(CaptionResult {
            artifact_path: artifact.to_string_lossy().into_owned(),
            cached: false,
            translation_backend,
        })
    }

    /// 目标语言（无目标时为源语言）已有字幕则直接复用
    async fn cached_result(&self, job: &CaptionJob) -> Option<CaptionResult> {
        let language = job
            .target_language
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| Some(job.source_language.as_str()).filter(|s| !s.is_empty()))?;

        let existing = match self.caption_store.find_existing(&job.media_path, language).await {
            Ok(Some(path)) => path,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(task_id = %job.task_id, error = %e, "Existing caption lookup failed");
                return None;
            }
        };

        let content = match self.caption_store.read(&existing).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    task_id = %job.task_id,
                    path = %existing.display(),
                    error = %e,
                    "Existing caption unreadable, regenerating"
                );
                return None;
            }
        };

        tracing::info!(task_id = %job.task_id, path = %existing.display(), "Reusing existing caption");
        self.events.publish(
            &job.task_id,
            ProgressEvent::Complete {
                segment_count: crate::domain::subtitle::parse_srt(&content).len(),
                srt_content: content,
                language: Some(language.to_string()),
                language_probability: None,
                duration: None,
            },
        );

        Some(CaptionResult {
            artifact_path: existing.to_string_lossy().into_owned(),
            cached: true,
            translation_backend: None,
        })
    }

    async fn transcribe(
        &self,
        task_id: &str,
        source: &str,
        path: TranslationPath,
        plan: ProgressPlan,
        audio_path: &Path,
    ) -> Result<Transcript, PipelineError> {
        self.task_store
            .enter_stage(task_id, TaskStage::Transcribing, plan.entry(TaskStage::Transcribing))?;

        let mode = match path {
            TranslationPath::Engine => EngineMode::Translate,
            TranslationPath::None | TranslationPath::Secondary => EngineMode::Transcribe,
        };
        let request = TranscribeRequest {
            task_id: Some(task_id.to_string()),
            audio_path: audio_path.to_path_buf(),
            language: (!source.is_empty()).then(|| source.to_string()),
            mode,
        };

        let stream = self.engine.transcribe(request).await?;

        let events: &dyn ProgressEventPort = self.events.as_ref();
        let bridge = ProgressBridge::new(task_id, plan, self.task_store.as_ref(), events);
        Ok(bridge.consume(stream).await?)
    }
}

/// 按行翻译字幕文本，保留原有时间轴
async fn translate_cues(
    translator: &dyn TranslatorPort,
    cues: &[SubtitleCue],
    source: &str,
    target: &str,
) -> Result<String, TranslateError> {
    let text = cues
        .iter()
        .map(|c| c.text.replace('\n', " "))
        .collect::<Vec<_>>()
        .join("\n");

    let translated = translator.translate(&text, source, target).await?;
    let lines = align_lines(&translated, cues.len());

    let translated_cues: Vec<SubtitleCue> = cues
        .iter()
        .zip(lines)
        .map(|(cue, line)| SubtitleCue {
            text: line,
            ..cue.clone()
        })
        .collect();
    Ok(render_srt(&translated_cues))
}

async fn remove_temp_audio(task_id: &str, path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(task_id = %task_id, path = %path.display(), error = %e, "Failed to remove temp audio");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ExtractedAudio;
    use crate::domain::{TaskRecord, TaskStatus};
    use crate::infrastructure::adapters::{FakeEngine, FakeEngineConfig, FileCaptionStore};
    use crate::infrastructure::memory::InMemoryTaskStore;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    /// 记录所有进度写入的任务存储
    struct RecordingStore {
        inner: InMemoryTaskStore,
        progress: Mutex<Vec<f64>>,
    }

    impl RecordingStore {
        fn new() -> Self {
            let (tx, _rx) = mpsc::channel(8);
            Self {
                inner: InMemoryTaskStore::new(tx),
                progress: Mutex::new(Vec::new()),
            }
        }

        fn observed(&self) -> Vec<f64> {
            let mut seen: Vec<f64> = Vec::new();
            for p in self.progress.lock().unwrap().iter() {
                let p = (p * 100.0).round() / 100.0;
                if seen.last() != Some(&p) {
                    seen.push(p);
                }
            }
            seen
        }

        fn record(&self, task_id: &str) {
            if let Some(task) = self.inner.get(task_id) {
                self.progress.lock().unwrap().push(task.progress);
            }
        }
    }

    impl TaskStorePort for RecordingStore {
        fn submit(&self, job: CaptionJob) -> Result<TaskRecord, StoreError> {
            self.inner.submit(job)
        }
        fn create(&self, task_id: &str, duration: Option<f64>) -> Result<TaskRecord, StoreError> {
            self.inner.create(task_id, duration)
        }
        fn enter_stage(&self, task_id: &str, stage: TaskStage, progress: f64) -> Result<(), StoreError> {
            self.inner.enter_stage(task_id, stage, progress)?;
            self.record(task_id);
            Ok(())
        }
        fn set_duration(&self, task_id: &str, duration: f64) {
            self.inner.set_duration(task_id, duration)
        }
        fn update_progress(&self, task_id: &str, progress: f64, timestamp: f64) {
            self.inner.update_progress(task_id, progress, timestamp);
            self.record(task_id);
        }
        fn complete(&self, task_id: &str, result: CaptionResult) -> Result<(), StoreError> {
            self.inner.complete(task_id, result)?;
            self.record(task_id);
            Ok(())
        }
        fn fail(&self, task_id: &str, error: String) -> Result<(), StoreError> {
            self.inner.fail(task_id, error)
        }
        fn get(&self, task_id: &str) -> Option<TaskRecord> {
            self.inner.get(task_id)
        }
        fn poll(&self, task_id: &str) -> Option<TaskRecord> {
            self.inner.poll(task_id)
        }
        fn list(&self) -> Vec<TaskRecord> {
            self.inner.list()
        }
        fn remove(&self, task_id: &str) -> bool {
            self.inner.remove(task_id)
        }
    }

    /// 只写一个临时文件的提取器
    struct FakeExtractor {
        dir: PathBuf,
        fail: bool,
        produced: Mutex<Vec<PathBuf>>,
    }

    impl FakeExtractor {
        fn new(dir: &Path) -> Self {
            Self {
                dir: dir.to_path_buf(),
                fail: false,
                produced: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AudioExtractorPort for FakeExtractor {
        async fn extract(&self, _media_path: &Path, task_id: &str) -> Result<ExtractedAudio, ExtractError> {
            if self.fail {
                return Err(ExtractError::Failed("no audio stream".to_string()));
            }
            let path = self.dir.join(format!("{}.wav", task_id));
            tokio::fs::write(&path, b"RIFF").await.unwrap();
            self.produced.lock().unwrap().push(path.clone());
            Ok(ExtractedAudio { path, duration: None })
        }
    }

    struct UpperTranslator;

    #[async_trait]
    impl TranslatorPort for UpperTranslator {
        fn name(&self) -> &'static str {
            "upper"
        }

        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, TranslateError> {
            Ok(text.to_uppercase())
        }
    }

    struct Fixture {
        _media_dir: tempfile::TempDir,
        _audio_dir: tempfile::TempDir,
        media: PathBuf,
        store: Arc<RecordingStore>,
        extractor: Arc<FakeExtractor>,
        engine: Arc<FakeEngine>,
        events: Arc<EventPublisher>,
        pipeline: Pipeline,
    }

    fn fixture(engine: FakeEngineConfig, translator: Option<Arc<dyn TranslatorPort>>, extract_fails: bool) -> Fixture {
        let media_dir = tempfile::tempdir().unwrap();
        let audio_dir = tempfile::tempdir().unwrap();
        let media = media_dir.path().join("movie.mkv");
        std::fs::write(&media, b"video").unwrap();

        let store = Arc::new(RecordingStore::new());
        let mut extractor = FakeExtractor::new(audio_dir.path());
        extractor.fail = extract_fails;
        let extractor = Arc::new(extractor);
        let engine = Arc::new(FakeEngine::new(engine));
        let events = EventPublisher::new().arc();

        let pipeline = Pipeline {
            config: Arc::new(CaptionWorkerConfig::default()),
            task_store: store.clone(),
            extractor: extractor.clone(),
            engine: engine.clone(),
            translator,
            caption_store: Arc::new(FileCaptionStore::new()),
            events: events.clone(),
        };

        Fixture {
            _media_dir: media_dir,
            _audio_dir: audio_dir,
            media,
            store,
            extractor,
            engine,
            events,
            pipeline,
        }
    }

    fn job(media: &Path, source: &str, target: Option<&str>) -> CaptionJob {
        CaptionJob {
            task_id: "task-1".to_string(),
            media_path: media.to_path_buf(),
            source_language: source.to_string(),
            target_language: target.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_progress_sequence_without_translation() {
        let f = fixture(FakeEngineConfig::default(), None, false);
        f.store.create("task-1", None).unwrap();

        f.pipeline.process(job(&f.media, "ja", None)).await;

        let task = f.store.get("task-1").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 1.0);
        assert_eq!(task.timestamp, 10.0);

        let observed = f.store.observed();
        assert_eq!(&observed[..7], &[0.0, 0.10, 0.23, 0.36, 0.49, 0.62, 0.75]);
        assert_eq!(observed.last(), Some(&1.0));

        let result = task.result.unwrap();
        assert!(!result.cached);
        assert!(result.artifact_path.ends_with("movie.ja.srt"));
        let content = std::fs::read_to_string(&result.artifact_path).unwrap();
        assert!(content.contains("00:00:08,000 --> 00:00:10,000"));
        assert!(content.contains("line 5"));
    }

    #[tokio::test]
    async fn test_temp_audio_removed_after_transcription() {
        let f = fixture(FakeEngineConfig::default(), None, false);
        f.store.create("task-1", None).unwrap();

        f.pipeline.process(job(&f.media, "ja", None)).await;

        let produced = f.extractor.produced.lock().unwrap().clone();
        assert_eq!(produced.len(), 1);
        assert!(!produced[0].exists());
    }

    #[tokio::test]
    async fn test_engine_path_requests_translate_mode() {
        let f = fixture(FakeEngineConfig::default(), None, false);
        f.store.create("task-1", None).unwrap();

        f.pipeline.process(job(&f.media, "ja", Some("en"))).await;

        let task = f.store.get("task-1").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.result.unwrap().artifact_path.ends_with("movie.en.srt"));
        assert_eq!(f.engine.requests(), vec![(Some("ja".to_string()), EngineMode::Translate)]);
        assert!(f.store.observed().contains(&0.95));
    }

    #[tokio::test]
    async fn test_secondary_translation_keeps_timing() {
        let f = fixture(FakeEngineConfig::default(), Some(Arc::new(UpperTranslator)), false);
        f.store.create("task-1", None).unwrap();

        f.pipeline.process(job(&f.media, "ja", Some("fr"))).await;

        let task = f.store.get("task-1").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        let result = task.result.unwrap();
        assert_eq!(result.translation_backend.as_deref(), Some("upper"));
        assert!(result.artifact_path.ends_with("movie.fr.srt"));

        let content = std::fs::read_to_string(&result.artifact_path).unwrap();
        assert!(content.contains("LINE 1"));
        assert!(content.contains("00:00:00,000 --> 00:00:02,000"));
        assert!(f.store.observed().contains(&0.95));
    }

    #[tokio::test]
    async fn test_secondary_translation_without_translator_fails() {
        let f = fixture(FakeEngineConfig::default(), None, false);
        f.store.create("task-1", None).unwrap();

        f.pipeline.process(job(&f.media, "ja", Some("fr"))).await;

        let task = f.store.get("task-1").unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("no translation service"));
    }

    #[tokio::test]
    async fn test_existing_caption_is_reused() {
        let f = fixture(FakeEngineConfig::default(), None, false);
        f.store.create("task-1", None).unwrap();
        let existing = f.media.with_file_name("movie.english.srt");
        std::fs::write(&existing, "1\n00:00:00,000 --> 00:00:01,000\nhi\n").unwrap();

        f.pipeline.process(job(&f.media, "ja", Some("en"))).await;

        let task = f.store.get("task-1").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        let result = task.result.unwrap();
        assert!(result.cached);
        assert_eq!(PathBuf::from(result.artifact_path), existing);
        assert!(f.engine.requests().is_empty());
    }

    #[tokio::test]
    async fn test_engine_failure_fails_task_and_discards_output() {
        let engine = FakeEngineConfig {
            fail_after: Some(2),
            ..FakeEngineConfig::default()
        };
        let f = fixture(engine, None, false);
        f.store.create("task-1", None).unwrap();

        f.pipeline.process(job(&f.media, "ja", None)).await;

        let task = f.store.get("task-1").unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("fake engine failure"));
        assert!(task.progress < 1.0);
        assert!(!f.media.with_file_name("movie.ja.srt").exists());

        let sub = f.events.subscribe("task-1").unwrap();
        assert!(matches!(sub.snapshot.last(), Some(ProgressEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_empty_transcript_fails_without_artifact() {
        let engine = FakeEngineConfig {
            units: vec![],
            ..FakeEngineConfig::default()
        };
        let f = fixture(engine, None, false);
        f.store.create("task-1", None).unwrap();

        f.pipeline.process(job(&f.media, "ja", None)).await;

        let task = f.store.get("task-1").unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("no results"));
        assert!(task.result.is_none());
        assert!(!f.media.with_file_name("movie.ja.srt").exists());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_fatal() {
        let f = fixture(FakeEngineConfig::default(), None, true);
        f.store.create("task-1", None).unwrap();

        f.pipeline.process(job(&f.media, "ja", None)).await;

        let task = f.store.get("task-1").unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().starts_with("audio extraction failed"));
        assert!(f.engine.requests().is_empty());
    }

    #[tokio::test]
    async fn test_worker_processes_queued_jobs() {
        let f = fixture(FakeEngineConfig::default(), None, false);
        let (tx, rx) = mpsc::channel(4);
        let worker = CaptionWorker {
            queue_receiver: rx,
            pipeline: f.pipeline.clone(),
        };
        let handle = tokio::spawn(worker.run());

        f.store.create("task-1", None).unwrap();
        tx.send(job(&f.media, "ja", None)).await.unwrap();

        let mut status = TaskStatus::Queued;
        for _ in 0..200 {
            status = f.store.get("task-1").unwrap().status;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, TaskStatus::Completed);

        drop(tx);
        handle.await.unwrap();
    }
}
