//! Generate Caption Handler - 启动远程字幕任务并轮询到结束
//!
//! 每个轮询周期先检查取消信号，再等待一个周期并查询状态，
//! 每次都把进度上报给外部任务系统。

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::commands::generate_commands::*;
use crate::application::error::GenerateError;
use crate::application::ports::{
    CaptionServicePort, HostPort, ProgressSinkPort, StartTaskRequest, TaskStatusReport,
};
use crate::domain::CaptionResult;

/// 轮询配置
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub poll_interval: Duration,
    pub default_service_url: String,
    /// 成功后添加到条目的标签
    pub subtitled_label: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            default_service_url: "http://auto-caption-web:8000".to_string(),
            subtitled_label: "Subtitled".to_string(),
        }
    }
}

/// GenerateCaption Handler
pub struct GenerateCaptionHandler {
    service: Arc<dyn CaptionServicePort>,
    host: Option<Arc<dyn HostPort>>,
    sink: Arc<dyn ProgressSinkPort>,
    config: PollConfig,
}

impl GenerateCaptionHandler {
    pub fn new(
        service: Arc<dyn CaptionServicePort>,
        host: Option<Arc<dyn HostPort>>,
        sink: Arc<dyn ProgressSinkPort>,
        config: PollConfig,
    ) -> Self {
        Self {
            service,
            host,
            sink,
            config,
        }
    }

    pub async fn handle(
        &self,
        cmd: GenerateCaption,
        cancel: &CancellationToken,
    ) -> Result<GenerateOutcome, GenerateError> {
        let params = GenerateParams::validate(cmd, &self.config.default_service_url)?;
        let endpoint = self.service.resolve_endpoint(&params.service_url).await;

        tracing::info!(
            scene_id = ?params.scene_id,
            video_path = %params.video_path,
            language = %params.language,
            endpoint = %endpoint,
            "Generating caption"
        );

        let request = StartTaskRequest {
            video_path: params.video_path.clone(),
            language: params.language.clone(),
            translate_to: params.translate_to.clone(),
        };
        let started = self
            .service
            .start_task(&endpoint, &request)
            .await
            .map_err(GenerateError::Start)?;

        tracing::info!(task_id = %started.task_id, "Caption task started");

        let result = self.poll_until_done(&endpoint, &started.task_id, cancel).await?;

        if let Some(result) = result.as_ref() {
            self.after_completion(&params, result).await;
        }

        if !params.cooldown.is_zero() {
            tracing::info!(
                cooldown_secs = params.cooldown.as_secs(),
                "Cooling down before next task"
            );
            tokio::select! {
                _ = tokio::time::sleep(params.cooldown) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Cooldown cut short by cancellation");
                }
            }
        }

        Ok(GenerateOutcome {
            task_id: started.task_id,
            result,
        })
    }

    async fn poll_until_done(
        &self,
        endpoint: &str,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<CaptionResult>, GenerateError> {
        loop {
            if cancel.is_cancelled() {
                tracing::warn!(task_id = %task_id, "Polling interrupted");
                return Err(GenerateError::Interrupted);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = cancel.cancelled() => continue,
            }

            let status = self
                .service
                .task_status(endpoint, task_id)
                .await
                .map_err(GenerateError::Status)?;

            self.report(&status);

            match status.status.as_str() {
                "completed" => {
                    tracing::info!(task_id = %task_id, "Caption generation completed");
                    return Ok(status.result);
                }
                "failed" => {
                    let error = status.error.unwrap_or_else(|| "unknown error".to_string());
                    return Err(GenerateError::TaskFailed(error));
                }
                "queued" | "running" => continue,
                other => return Err(GenerateError::UnknownStatus(other.to_string())),
            }
        }
    }

    fn report(&self, status: &TaskStatusReport) {
        self.sink.progress(status.progress);
        if let Some(stage) = status.stage.as_deref() {
            self.sink.stage(stage, status.progress);
        }
    }

    /// 完成后的副作用，失败只记录警告
    async fn after_completion(&self, params: &GenerateParams, result: &CaptionResult) {
        let Some(host) = self.host.as_ref() else {
            return;
        };

        if !result.artifact_path.is_empty() {
            tracing::info!(caption_path = %result.artifact_path, "Caption saved");
            if let Err(e) = host.scan_metadata(&[result.artifact_path.clone()]).await {
                tracing::warn!(error = %e, "Failed to trigger metadata scan");
            }
        }

        if let Some(scene_id) = params.scene_id.as_deref() {
            if let Err(e) = host.add_label(scene_id, &self.config.subtitled_label).await {
                tracing::warn!(
                    scene_id = %scene_id,
                    label = %self.config.subtitled_label,
                    error = %e,
                    "Failed to add label"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        CaptionServiceError, EnqueueRequest, HostError, HostScene, HostTag, StartTaskResponse,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedService {
        statuses: Mutex<VecDeque<TaskStatusReport>>,
        start_calls: AtomicUsize,
        status_calls: AtomicUsize,
        fail_start: bool,
    }

    impl ScriptedService {
        fn new(statuses: Vec<(&str, f64)>) -> Self {
            Self {
                statuses: Mutex::new(
                    statuses
                        .into_iter()
                        .map(|(status, progress)| report(status, progress))
                        .collect(),
                ),
                start_calls: AtomicUsize::new(0),
                status_calls: AtomicUsize::new(0),
                fail_start: false,
            }
        }
    }

    fn report(status: &str, progress: f64) -> TaskStatusReport {
        TaskStatusReport {
            task_id: "task-1".to_string(),
            status: status.to_string(),
            progress,
            stage: Some("transcribing".to_string()),
            error: (status == "failed").then(|| "engine exploded".to_string()),
            result: (status == "completed").then(|| CaptionResult {
                artifact_path: "/media/a.en.srt".to_string(),
                cached: false,
                translation_backend: None,
            }),
        }
    }

    #[async_trait]
    impl CaptionServicePort for ScriptedService {
        async fn resolve_endpoint(&self, configured: &str) -> String {
            configured.to_string()
        }

        async fn start_task(
            &self,
            _endpoint: &str,
            _request: &StartTaskRequest,
        ) -> Result<StartTaskResponse, CaptionServiceError> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(CaptionServiceError::NetworkError("connection refused".to_string()));
            }
            Ok(StartTaskResponse {
                task_id: "task-1".to_string(),
                status: "queued".to_string(),
            })
        }

        async fn task_status(
            &self,
            _endpoint: &str,
            _task_id: &str,
        ) -> Result<TaskStatusReport, CaptionServiceError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| CaptionServiceError::InvalidResponse("script exhausted".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        scanned: Mutex<Vec<String>>,
        labelled: Mutex<Vec<(String, String)>>,
        fail_scan: bool,
    }

    #[async_trait]
    impl HostPort for RecordingHost {
        async fn all_tags(&self) -> Result<Vec<HostTag>, HostError> {
            Ok(vec![])
        }

        async fn find_scenes_by_tags(&self, _: &[String], _: u32) -> Result<Vec<HostScene>, HostError> {
            Ok(vec![])
        }

        async fn scan_metadata(&self, paths: &[String]) -> Result<(), HostError> {
            if self.fail_scan {
                return Err(HostError::QueryError("scan rejected".to_string()));
            }
            self.scanned.lock().unwrap().extend(paths.iter().cloned());
            Ok(())
        }

        async fn add_label(&self, scene_id: &str, label: &str) -> Result<(), HostError> {
            self.labelled
                .lock()
                .unwrap()
                .push((scene_id.to_string(), label.to_string()));
            Ok(())
        }

        async fn enqueue_task(&self, _: EnqueueRequest) -> Result<String, HostError> {
            Ok("job".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        values: Mutex<Vec<f64>>,
    }

    impl ProgressSinkPort for RecordingSink {
        fn progress(&self, fraction: f64) {
            self.values.lock().unwrap().push(fraction);
        }

        fn stage(&self, _stage: &str, _fraction: f64) {}
    }

    fn config() -> PollConfig {
        PollConfig {
            poll_interval: Duration::from_millis(1),
            default_service_url: "http://svc:8000".to_string(),
            subtitled_label: "Subtitled".to_string(),
        }
    }

    fn command() -> GenerateCaption {
        GenerateCaption {
            scene_id: Some("42".to_string()),
            video_path: "/media/a.mp4".to_string(),
            language: "ja".to_string(),
            translate_to: Some("en".to_string()),
            service_url: None,
            cooldown_secs: 0,
        }
    }

    fn handler(
        service: Arc<ScriptedService>,
        host: Arc<RecordingHost>,
        sink: Arc<RecordingSink>,
    ) -> GenerateCaptionHandler {
        GenerateCaptionHandler::new(service, Some(host), sink, config())
    }

    #[tokio::test]
    async fn test_polls_until_completed_and_runs_side_effects() {
        let service = Arc::new(ScriptedService::new(vec![
            ("queued", 0.0),
            ("running", 0.4),
            ("completed", 1.0),
        ]));
        let host = Arc::new(RecordingHost::default());
        let sink = Arc::new(RecordingSink::default());

        let outcome = handler(service.clone(), host.clone(), sink.clone())
            .handle(command(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.task_id, "task-1");
        assert_eq!(*sink.values.lock().unwrap(), vec![0.0, 0.4, 1.0]);
        assert_eq!(*host.scanned.lock().unwrap(), vec!["/media/a.en.srt".to_string()]);
        assert_eq!(
            *host.labelled.lock().unwrap(),
            vec![("42".to_string(), "Subtitled".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_task_propagates_error() {
        let service = Arc::new(ScriptedService::new(vec![("running", 0.2), ("failed", 0.2)]));
        let host = Arc::new(RecordingHost::default());
        let sink = Arc::new(RecordingSink::default());

        let err = handler(service, host.clone(), sink)
            .handle(command(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            GenerateError::TaskFailed(msg) => assert_eq!(msg, "engine exploded"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(host.scanned.lock().unwrap().is_empty());
        assert!(host.labelled.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_is_fatal() {
        let service = Arc::new(ScriptedService::new(vec![("paused", 0.1)]));
        let err = handler(service, Arc::default(), Arc::default())
            .handle(command(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnknownStatus(s) if s == "paused"));
    }

    #[tokio::test]
    async fn test_cancellation_checked_before_network() {
        let service = Arc::new(ScriptedService::new(vec![("running", 0.1)]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = handler(service.clone(), Arc::default(), Arc::default())
            .handle(command(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Interrupted));
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_side_effect_failure_does_not_fail_run() {
        let service = Arc::new(ScriptedService::new(vec![("completed", 1.0)]));
        let host = Arc::new(RecordingHost {
            fail_scan: true,
            ..Default::default()
        });

        let outcome = handler(service, host.clone(), Arc::default())
            .handle(command(), &CancellationToken::new())
            .await;

        assert!(outcome.is_ok());
        assert_eq!(host.labelled.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_precondition_failure_makes_no_requests() {
        let service = Arc::new(ScriptedService::new(vec![]));
        let mut cmd = command();
        cmd.video_path = String::new();

        let err = handler(service.clone(), Arc::default(), Arc::default())
            .handle(cmd, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Precondition(_)));
        assert_eq!(service.start_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_failure_is_reported() {
        let mut service = ScriptedService::new(vec![]);
        service.fail_start = true;

        let err = handler(Arc::new(service), Arc::default(), Arc::default())
            .handle(command(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Start(_)));
        assert!(err.to_string().starts_with("failed to start caption task"));
    }
}
