//! In-Memory Task Store Implementation

use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{CaptionJob, StoreError, TaskStorePort};
use crate::domain::{CaptionResult, TaskRecord, TaskStage};

/// 默认容量上限
const DEFAULT_CAPACITY: usize = 1000;

/// 默认空闲时间：超过该时间未被轮询的已结束任务可被淘汰
const DEFAULT_IDLE_SECS: i64 = 600;

/// 内存任务存储
pub struct InMemoryTaskStore {
    /// task_id -> TaskRecord
    tasks: DashMap<String, TaskRecord>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<CaptionJob>,
    capacity: usize,
    idle: Duration,
}

impl InMemoryTaskStore {
    pub fn new(queue_sender: mpsc::Sender<CaptionJob>) -> Self {
        Self::with_limits(queue_sender, DEFAULT_CAPACITY, DEFAULT_IDLE_SECS as u64)
    }

    pub fn with_limits(queue_sender: mpsc::Sender<CaptionJob>, capacity: usize, idle_secs: u64) -> Self {
        Self {
            tasks: DashMap::new(),
            queue_sender,
            capacity: capacity.max(1),
            idle: Duration::seconds(idle_secs.min(u32::MAX as u64) as i64),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 超出容量时淘汰最旧的已结束且空闲的任务
    fn evict_if_needed(&self) {
        if self.tasks.len() < self.capacity {
            return;
        }

        let now = Utc::now();
        let mut candidates: Vec<(String, chrono::DateTime<Utc>)> = self
            .tasks
            .iter()
            .filter(|entry| entry.is_terminal())
            .filter_map(|entry| {
                let last_seen = entry.last_polled_at.unwrap_or(entry.updated_at).max(entry.updated_at);
                (now - last_seen >= self.idle).then(|| (entry.key().clone(), last_seen))
            })
            .collect();
        candidates.sort_by_key(|(_, last_seen)| *last_seen);

        let excess = self.tasks.len() + 1 - self.capacity;
        let mut evicted = 0;
        for (task_id, _) in candidates.into_iter().take(excess) {
            if self.tasks.remove(&task_id).is_some() {
                evicted += 1;
            }
        }

        if evicted > 0 {
            tracing::debug!(evicted = evicted, remaining = self.tasks.len(), "Evicted idle finished tasks");
        } else {
            tracing::warn!(
                size = self.tasks.len(),
                capacity = self.capacity,
                "Task store over capacity, nothing evictable"
            );
        }
    }
}

impl TaskStorePort for InMemoryTaskStore {
    fn submit(&self, job: CaptionJob) -> Result<TaskRecord, StoreError> {
        let record = self.create(&job.task_id, None)?;
        let task_id = job.task_id.clone();

        if let Err(e) = self.queue_sender.try_send(job) {
            tracing::warn!(task_id = %task_id, error = %e, "Failed to enqueue task");
            self.tasks.remove(&task_id);
            return Err(StoreError::QueueUnavailable(e.to_string()));
        }

        tracing::debug!(task_id = %task_id, "Task submitted");
        Ok(record)
    }

    fn create(&self, task_id: &str, duration: Option<f64>) -> Result<TaskRecord, StoreError> {
        if self.tasks.contains_key(task_id) {
            return Err(StoreError::AlreadyExists(task_id.to_string()));
        }
        self.evict_if_needed();

        let record = TaskRecord::new(task_id, duration);
        self.tasks.insert(task_id.to_string(), record.clone());
        Ok(record)
    }

    fn enter_stage(&self, task_id: &str, stage: TaskStage, progress: f64) -> Result<(), StoreError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;

        let old_stage = task.stage;
        task.enter_stage(stage, progress)?;

        tracing::debug!(
            task_id = %task_id,
            old_stage = ?old_stage,
            new_stage = %stage,
            progress = task.progress,
            "Task stage changed"
        );
        Ok(())
    }

    fn set_duration(&self, task_id: &str, duration: f64) {
        if let Some(mut task) = self.tasks.get_mut(task_id) {
            task.set_duration(duration);
        }
    }

    fn update_progress(&self, task_id: &str, progress: f64, timestamp: f64) {
        if let Some(mut task) = self.tasks.get_mut(task_id) {
            if let Err(e) = task.advance(progress, timestamp) {
                tracing::debug!(task_id = %task_id, error = %e, "Ignoring progress update");
            }
        }
    }

    fn complete(&self, task_id: &str, result: CaptionResult) -> Result<(), StoreError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        task.complete(result)?;
        Ok(())
    }

    fn fail(&self, task_id: &str, error: String) -> Result<(), StoreError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        task.fail(error)?;
        Ok(())
    }

    fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.tasks.get(task_id).map(|t| t.clone())
    }

    fn poll(&self, task_id: &str) -> Option<TaskRecord> {
        self.tasks.get_mut(task_id).map(|mut t| {
            t.last_polled_at = Some(Utc::now());
            t.clone()
        })
    }

    fn list(&self) -> Vec<TaskRecord> {
        let mut tasks: Vec<TaskRecord> = self.tasks.iter().map(|t| t.clone()).collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }

    fn remove(&self, task_id: &str) -> bool {
        self.tasks.remove(task_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use std::path::PathBuf;

    fn job(id: &str) -> CaptionJob {
        CaptionJob {
            task_id: id.to_string(),
            media_path: PathBuf::from("/media/a.mp4"),
            source_language: "ja".to_string(),
            target_language: Some("en".to_string()),
        }
    }

    fn done() -> CaptionResult {
        CaptionResult {
            artifact_path: "/media/a.en.srt".to_string(),
            cached: false,
            translation_backend: None,
        }
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let (tx, mut rx) = mpsc::channel(10);
        let store = InMemoryTaskStore::new(tx);

        let record = store.submit(job("t1")).unwrap();
        assert_eq!(record.status, TaskStatus::Queued);

        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.task_id, "t1");

        store.enter_stage("t1", TaskStage::ExtractingAudio, 0.0).unwrap();
        assert_eq!(store.get("t1").unwrap().status, TaskStatus::Running);

        store.enter_stage("t1", TaskStage::Transcribing, 0.10).unwrap();
        store.update_progress("t1", 0.5, 5.0);
        let task = store.get("t1").unwrap();
        assert_eq!(task.stage, Some(TaskStage::Transcribing));
        assert_eq!(task.progress, 0.5);
        assert_eq!(task.timestamp, 5.0);

        store.complete("t1", done()).unwrap();
        let task = store.get("t1").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 1.0);
    }

    #[tokio::test]
    async fn test_update_progress_on_missing_task_is_noop() {
        let (tx, _rx) = mpsc::channel(10);
        let store = InMemoryTaskStore::new(tx);
        store.update_progress("missing", 0.5, 1.0);
        assert!(store.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_submit_rejected() {
        let (tx, _rx) = mpsc::channel(10);
        let store = InMemoryTaskStore::new(tx);
        store.submit(job("t1")).unwrap();
        assert!(matches!(store.submit(job("t1")), Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_full_queue_rolls_back_record() {
        let (tx, _rx) = mpsc::channel(1);
        let store = InMemoryTaskStore::new(tx);
        store.submit(job("t1")).unwrap();
        assert!(matches!(store.submit(job("t2")), Err(StoreError::QueueUnavailable(_))));
        assert!(store.get("t2").is_none());
    }

    #[tokio::test]
    async fn test_complete_after_fail_rejected() {
        let (tx, _rx) = mpsc::channel(10);
        let store = InMemoryTaskStore::new(tx);
        store.create("t1", None).unwrap();
        store.fail("t1", "boom".to_string()).unwrap();
        assert!(store.complete("t1", done()).is_err());
        assert_eq!(store.get("t1").unwrap().status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_eviction_only_removes_idle_finished_tasks() {
        let (tx, _rx) = mpsc::channel(10);
        let store = InMemoryTaskStore::with_limits(tx, 2, 0);

        store.create("finished", None).unwrap();
        store.complete("finished", done()).unwrap();
        store.create("running", None).unwrap();
        store.enter_stage("running", TaskStage::ExtractingAudio, 0.0).unwrap();

        store.create("new", None).unwrap();
        assert!(store.get("finished").is_none());
        assert!(store.get("running").is_some());
        assert!(store.get("new").is_some());
    }

    #[tokio::test]
    async fn test_recently_polled_task_is_kept() {
        let (tx, _rx) = mpsc::channel(10);
        let store = InMemoryTaskStore::with_limits(tx, 1, 3600);

        store.create("finished", None).unwrap();
        store.complete("finished", done()).unwrap();
        store.poll("finished").unwrap();

        store.create("new", None).unwrap();
        assert!(store.get("finished").is_some());
        assert_eq!(store.len(), 2);
    }
}
