//! Caption Task Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::{
    GetTaskResult, GetTaskStatus, ListTasks, RemoveCaptionTask, StartCaptionTask, TaskResultView,
    TaskStatusView,
};
use crate::domain::CaptionResult;
use crate::infrastructure::http::dto::{
    ApiResponse, Empty, PendingResultResponse, StartCaptionRequest, StartCaptionResponse,
    TaskListResponse,
};
use crate::infrastructure::http::error::{errno, ApiError};
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Start
// ============================================================================

pub async fn start_caption(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartCaptionRequest>,
) -> Result<Json<ApiResponse<StartCaptionResponse>>, ApiError> {
    let cmd = StartCaptionTask {
        video_path: req.video_path,
        language: req.language,
        translate_to: req.translate_to,
    };

    let result = state.start_caption_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(StartCaptionResponse {
        task_id: result.task_id,
        status: result.status,
    })))
}

// ============================================================================
// Status / Result
// ============================================================================

pub async fn get_task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<TaskStatusView>>, ApiError> {
    let view = state.get_task_status_handler.handle(GetTaskStatus { task_id })?;
    Ok(Json(ApiResponse::success(view)))
}

/// 结果接口使用真实 HTTP 状态码：
/// 404 未知任务，500 任务失败，202 尚未完成，200 返回结果
pub async fn get_task_result(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Response {
    match state.get_task_result_handler.handle(GetTaskResult { task_id }) {
        Ok(TaskResultView::Ready(result)) => {
            (StatusCode::OK, Json(ApiResponse::<CaptionResult>::success(result))).into_response()
        }
        Ok(TaskResultView::Pending { status, progress }) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(PendingResultResponse { status, progress })),
        )
            .into_response(),
        Ok(TaskResultView::Failed(error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(errno::INTERNAL_ERROR, error)),
        )
            .into_response(),
        Err(e) => {
            let e = ApiError::from(e);
            let status = if e.errno() == errno::NOT_FOUND {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(ApiResponse::<()>::error(e.errno(), e.message()))).into_response()
        }
    }
}

// ============================================================================
// List / Remove
// ============================================================================

pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<ApiResponse<TaskListResponse>> {
    let tasks = state.list_tasks_handler.handle(ListTasks);
    Json(ApiResponse::success(TaskListResponse {
        total: tasks.len(),
        tasks,
    }))
}

pub async fn remove_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.remove_caption_handler.handle(RemoveCaptionTask { task_id })?;
    Ok(Json(ApiResponse::ok()))
}

#[cfg(test)]
mod tests {
    use crate::domain::CaptionResult;
    use crate::infrastructure::http::routes::create_routes;
    use crate::infrastructure::http::state::test_support::test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_then_status() {
        let (state, mut rx) = test_state();
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("movie.mp4");
        std::fs::write(&media, b"video").unwrap();
        let app = create_routes().with_state(state);

        let (status, body) = send(
            app.clone(),
            post_json(
                "/auto-caption/start",
                json!({"video_path": media.to_string_lossy(), "language": "ja", "translate_to": "en"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["status"], "queued");
        let task_id = body["data"]["task_id"].as_str().unwrap().to_string();

        let job = rx.recv().await.unwrap();
        assert_eq!(job.task_id, task_id);
        assert_eq!(job.target_language.as_deref(), Some("en"));

        let (_, body) = send(app, get(&format!("/auto-caption/status/{}", task_id))).await;
        assert_eq!(body["data"]["task_id"], task_id.as_str());
        assert_eq!(body["data"]["progress"], 0.0);
    }

    #[tokio::test]
    async fn test_start_rejects_missing_media() {
        let (state, _rx) = test_state();
        let app = create_routes().with_state(state);

        let (status, body) = send(
            app,
            post_json("/auto-caption/start", json!({"video_path": "/no/such/file.mp4", "language": "ja"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errno"], 404);
    }

    #[tokio::test]
    async fn test_start_rejects_unsupported_language() {
        let (state, _rx) = test_state();
        let app = create_routes().with_state(state);

        let (_, body) = send(
            app,
            post_json("/auto-caption/start", json!({"video_path": "/tmp/x.mp4", "language": "xx"})),
        )
        .await;
        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_status_unknown_task() {
        let (state, _rx) = test_state();
        let app = create_routes().with_state(state);

        let (status, body) = send(app, get("/auto-caption/status/nope")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errno"], 404);
    }

    #[tokio::test]
    async fn test_result_status_codes() {
        let (state, _rx) = test_state();
        state.task_store.create("pending", None).unwrap();
        state.task_store.create("failed", None).unwrap();
        state.task_store.fail("failed", "engine exploded".to_string()).unwrap();
        state.task_store.create("done", None).unwrap();
        state
            .task_store
            .complete(
                "done",
                CaptionResult {
                    artifact_path: "/media/a.en.srt".to_string(),
                    cached: false,
                    translation_backend: None,
                },
            )
            .unwrap();
        let app = create_routes().with_state(state);

        let (status, _) = send(app.clone(), get("/auto-caption/result/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(app.clone(), get("/auto-caption/result/pending")).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["data"]["status"], "queued");

        let (status, body) = send(app.clone(), get("/auto-caption/result/failed")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "engine exploded");

        let (status, body) = send(app, get("/auto-caption/result/done")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["artifact_path"], "/media/a.en.srt");
    }

    #[tokio::test]
    async fn test_list_and_remove() {
        let (state, _rx) = test_state();
        state.task_store.create("a", None).unwrap();
        state.task_store.create("b", None).unwrap();
        state.task_store.fail("b", "x".to_string()).unwrap();
        let app = create_routes().with_state(state);

        let (_, body) = send(app.clone(), get("/auto-caption/tasks")).await;
        assert_eq!(body["data"]["total"], 2);

        let delete = |id: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/auto-caption/tasks/{}", id))
                .body(Body::empty())
                .unwrap()
        };
        let (_, body) = send(app.clone(), delete("a")).await;
        assert_eq!(body["errno"], 409);

        let (_, body) = send(app.clone(), delete("b")).await;
        assert_eq!(body["errno"], 0);

        let (_, body) = send(app, get("/auto-caption/tasks")).await;
        assert_eq!(body["data"]["total"], 1);
    }
}
