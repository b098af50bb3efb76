//! Health Handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::dto::{HealthResponse, HealthStatus};
use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// 存活检查
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 依赖服务健康检查；任一已配置的依赖不可达时为 degraded
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let engine = state.engine.health_check().await;
    let translation = match &state.translator {
        Some(translator) => Some(translator.health_check().await),
        None => None,
    };

    let status = if engine && translation != Some(false) {
        HealthStatus::Healthy
    } else {
        tracing::warn!(engine = engine, translation = ?translation, "Dependency unreachable");
        HealthStatus::Degraded
    };

    let active_tasks = state
        .task_store
        .list()
        .iter()
        .filter(|t| !t.is_terminal())
        .count();

    Json(HealthResponse {
        status,
        engine,
        translation,
        active_tasks,
    })
}

#[cfg(test)]
mod tests {
    use crate::infrastructure::http::routes::create_routes;
    use crate::infrastructure::http::state::test_support::test_state;
    use axum::{body::Body, http::Request};
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_engine_and_tasks() {
        let (state, _rx) = test_state();
        state.task_store.create("t1", None).unwrap();
        let app = create_routes().with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["engine"], true);
        assert!(body["translation"].is_null());
        assert_eq!(body["active_tasks"], 1);
    }

    #[tokio::test]
    async fn test_ping() {
        let (state, _rx) = test_state();
        let app = create_routes().with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }
}
