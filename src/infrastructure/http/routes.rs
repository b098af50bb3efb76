//! HTTP Routes
//!
//! API Endpoints:
//! - /auto-caption/start              POST    提交字幕任务
//! - /auto-caption/status/{task_id}   GET     查询任务状态
//! - /auto-caption/result/{task_id}   GET     获取任务结果（404 / 500 / 202 / 200）
//! - /auto-caption/events/{task_id}   GET     NDJSON 进度事件流
//! - /auto-caption/tasks              GET     列出所有任务
//! - /auto-caption/tasks/{task_id}    DELETE  删除已结束的任务
//! - /health                          GET     依赖服务健康状态
//! - /api/ping                        GET     存活检查

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/auto-caption", caption_routes())
        .route("/health", get(handlers::health))
        .route("/api/ping", get(handlers::ping))
}

/// 字幕任务路由
fn caption_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(handlers::start_caption))
        .route("/status/:task_id", get(handlers::get_task_status))
        .route("/result/:task_id", get(handlers::get_task_result))
        .route("/events/:task_id", get(handlers::task_events))
        .route("/tasks", get(handlers::list_tasks))
        .route("/tasks/:task_id", delete(handlers::remove_task))
}
