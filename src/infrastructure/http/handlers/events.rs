//! Progress Event Feed - NDJSON 进度事件流

use axum::{
    body::Body,
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use futures_util::{stream, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::domain::ProgressEvent;
use crate::infrastructure::events::TaskSubscription;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// 以 NDJSON 推送任务的进度事件，终止事件之后关闭连接
pub async fn task_events(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let subscription = match state.event_publisher.subscribe(&task_id) {
        Some(subscription) => subscription,
        None => {
            let task = state
                .task_store
                .get(&task_id)
                .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;
            if task.is_terminal() {
                return Err(ApiError::NotFound(format!(
                    "Event stream for task {} has expired",
                    task_id
                )));
            }
            // 任务尚在队列中，提前建立通道
            state.event_publisher.register(&task_id);
            state
                .event_publisher
                .subscribe(&task_id)
                .ok_or_else(|| ApiError::Internal(format!("Event channel missing for {}", task_id)))?
        }
    };

    tracing::debug!(task_id = %task_id, "Event stream opened");

    Ok((
        [(CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(event_lines(task_id, subscription)),
    )
        .into_response())
}

fn event_lines(
    task_id: String,
    subscription: TaskSubscription,
) -> impl Stream<Item = Result<String, Infallible>> {
    let TaskSubscription { snapshot, receiver } = subscription;
    let finished = snapshot.iter().any(ProgressEvent::is_terminal);
    let receiver = receiver.filter(|_| !finished);

    let live = stream::unfold(receiver, |receiver| async move {
        let mut receiver = receiver?;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let next = (!event.is_terminal()).then_some(receiver);
                    return Some((event, next));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped = skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    stream::iter(snapshot).chain(live).filter_map(move |event| {
        let line = match event.to_line() {
            Ok(line) => Some(Ok(line)),
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "Failed to encode progress event");
                None
            }
        };
        async move { line }
    })
}
