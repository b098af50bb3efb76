//! Event Publisher Implementation
//!
//! 按任务广播进度事件，供 NDJSON 事件流订阅

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::ProgressEventPort;
use crate::domain::ProgressEvent;

/// 每个任务的广播通道容量
const CHANNEL_CAPACITY: usize = 256;

/// 已结束任务的通道保留时长（秒）
const DEFAULT_RETENTION_SECS: i64 = 600;

struct TaskChannel {
    sender: broadcast::Sender<ProgressEvent>,
    /// 最近一条进度事件
    last_progress: Option<ProgressEvent>,
    /// 终止事件（complete / error）
    terminal: Option<ProgressEvent>,
    finished_at: Option<DateTime<Utc>>,
}

impl TaskChannel {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            last_progress: None,
            terminal: None,
            finished_at: None,
        }
    }

    fn snapshot(&self) -> Vec<ProgressEvent> {
        self.last_progress
            .iter()
            .chain(self.terminal.iter())
            .cloned()
            .collect()
    }
}

/// 订阅结果：已发生事件的快照 + 后续事件的接收端
pub struct TaskSubscription {
    pub snapshot: Vec<ProgressEvent>,
    /// 任务已结束时为 None
    pub receiver: Option<broadcast::Receiver<ProgressEvent>>,
}

/// 事件发布器
pub struct EventPublisher {
    /// task_id -> channel
    channels: DashMap<String, TaskChannel>,
    retention: Duration,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION_SECS as u64)
    }

    pub fn with_retention(retention_secs: u64) -> Self {
        Self {
            channels: DashMap::new(),
            retention: Duration::seconds(retention_secs.min(u32::MAX as u64) as i64),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册任务的事件通道，同时清理过期的已结束通道
    pub fn register(&self, task_id: &str) {
        self.prune_finished();
        self.channels
            .entry(task_id.to_string())
            .or_insert_with(TaskChannel::new);
    }

    /// 订阅任务事件；任务未注册时返回 None
    pub fn subscribe(&self, task_id: &str) -> Option<TaskSubscription> {
        self.channels.get(task_id).map(|channel| TaskSubscription {
            snapshot: channel.snapshot(),
            receiver: channel
                .terminal
                .is_none()
                .then(|| channel.sender.subscribe()),
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn prune_finished(&self) {
        let cutoff = Utc::now() - self.retention;
        self.channels
            .retain(|_, channel| channel.finished_at.map_or(true, |t| t > cutoff));
    }

    /// 发布事件到指定任务
    fn publish_to_task(&self, task_id: &str, event: ProgressEvent) {
        let mut channel = self
            .channels
            .entry(task_id.to_string())
            .or_insert_with(TaskChannel::new);

        if channel.terminal.is_some() {
            tracing::debug!(task_id = %task_id, "Ignoring event after terminal event");
            return;
        }

        if event.is_terminal() {
            channel.terminal = Some(event.clone());
            channel.finished_at = Some(Utc::now());
        } else {
            channel.last_progress = Some(event.clone());
        }

        if let Err(e) = channel.sender.send(event) {
            tracing::trace!(task_id = %task_id, error = %e, "No event subscribers");
        }
    }
}

impl ProgressEventPort for EventPublisher {
    fn publish(&self, task_id: &str, event: ProgressEvent) {
        self.publish_to_task(task_id, event);
    }

    fn unregister(&self, task_id: &str) {
        self.channels.remove(task_id);
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
