//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    RemoveCaptionTaskHandler, StartCaptionTaskHandler,
    // Query handlers
    GetTaskResultHandler, GetTaskStatusHandler, ListTasksHandler,
    // Ports
    CaptionStorePort, TaskStorePort, TranscriptionEnginePort, TranslatorPort,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub task_store: Arc<dyn TaskStorePort>,
    pub engine: Arc<dyn TranscriptionEnginePort>,
    pub translator: Option<Arc<dyn TranslatorPort>>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub start_caption_handler: StartCaptionTaskHandler,
    pub remove_caption_handler: RemoveCaptionTaskHandler,

    // ========== Query Handlers ==========
    pub get_task_status_handler: GetTaskStatusHandler,
    pub get_task_result_handler: GetTaskResultHandler,
    pub list_tasks_handler: ListTasksHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        task_store: Arc<dyn TaskStorePort>,
        caption_store: Arc<dyn CaptionStorePort>,
        engine: Arc<dyn TranscriptionEnginePort>,
        translator: Option<Arc<dyn TranslatorPort>>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            // Ports
            task_store: task_store.clone(),
            engine,
            translator,
            event_publisher: event_publisher.clone(),

            // Command handlers
            start_caption_handler: StartCaptionTaskHandler::new(task_store.clone(), caption_store),
            remove_caption_handler: RemoveCaptionTaskHandler::new(task_store.clone(), event_publisher),

            // Query handlers
            get_task_status_handler: GetTaskStatusHandler::new(task_store.clone()),
            get_task_result_handler: GetTaskResultHandler::new(task_store.clone()),
            list_tasks_handler: ListTasksHandler::new(task_store),
        }
    }
}
