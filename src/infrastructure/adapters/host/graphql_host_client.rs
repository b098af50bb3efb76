//! GraphQL Host Client - 宿主媒体库 GraphQL 客户端
//!
//! 实现 HostPort trait
//!
//! POST {url}  body: {"query": "...", "variables": {...}}
//! 认证头: ApiKey: <key>

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::application::ports::{
    EnqueueRequest, HostError, HostPort, HostScene, HostTag, HostTagRef,
};

const ALL_TAGS_QUERY: &str = "query AllTags { allTags { id name children { id name } } }";

const FIND_SCENES_QUERY: &str = r#"query FindScenes($filter: FindFilterType, $scene_filter: SceneFilterType) {
  findScenes(filter: $filter, scene_filter: $scene_filter) {
    count
    scenes {
      id
      title
      files { path }
      tags { id name }
      captions { language_code }
      paths { caption }
    }
  }
}"#;

const FIND_SCENE_TAGS_QUERY: &str = "query FindScene($id: ID!) { findScene(id: $id) { id tags { id name } } }";

const METADATA_SCAN_MUTATION: &str =
    "mutation MetadataScan($input: ScanMetadataInput!) { metadataScan(input: $input) }";

const SCENE_UPDATE_MUTATION: &str =
    "mutation SceneUpdate($input: SceneUpdateInput!) { sceneUpdate(input: $input) { id } }";

const RUN_PLUGIN_TASK_MUTATION: &str = r#"mutation RunPluginTask($plugin_id: ID!, $task_name: String, $description: String, $args_map: Map) {
  runPluginTask(plugin_id: $plugin_id, task_name: $task_name, description: $description, args_map: $args_map)
}"#;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TagRef {
    id: String,
    name: String,
}

impl From<TagRef> for HostTagRef {
    fn from(t: TagRef) -> Self {
        Self { id: t.id, name: t.name }
    }
}

#[derive(Debug, Deserialize)]
struct Tag {
    id: String,
    name: String,
    #[serde(default)]
    children: Vec<TagRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllTagsData {
    all_tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    path: String,
}

#[derive(Debug, Deserialize)]
struct SceneCaption {
    language_code: String,
}

#[derive(Debug, Deserialize)]
struct ScenePaths {
    #[serde(default)]
    caption: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Scene {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    files: Vec<SceneFile>,
    #[serde(default)]
    tags: Vec<TagRef>,
    #[serde(default)]
    captions: Option<Vec<SceneCaption>>,
    #[serde(default)]
    paths: Option<ScenePaths>,
}

impl From<Scene> for HostScene {
    fn from(s: Scene) -> Self {
        Self {
            id: s.id,
            title: s.title,
            file_paths: s.files.into_iter().map(|f| f.path).collect(),
            tags: s.tags.into_iter().map(HostTagRef::from).collect(),
            caption_languages: s
                .captions
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.language_code)
                .collect(),
            caption_path: s.paths.and_then(|p| p.caption),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FindScenesResult {
    count: u64,
    scenes: Vec<Scene>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindScenesData {
    find_scenes: FindScenesResult,
}

#[derive(Debug, Deserialize)]
struct SceneTags {
    tags: Vec<TagRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindSceneData {
    find_scene: Option<SceneTags>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunPluginTaskData {
    run_plugin_task: Value,
}

// ============================================================================
// Client
// ============================================================================

/// 宿主客户端配置
#[derive(Debug, Clone)]
pub struct GraphqlHostConfig {
    /// GraphQL 端点
    pub url: String,
    pub api_key: Option<String>,
    /// 投递宿主任务时使用的插件 id
    pub plugin_id: String,
    pub timeout_secs: u64,
}

impl Default for GraphqlHostConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9999/graphql".to_string(),
            api_key: None,
            plugin_id: "stash-auto-caption".to_string(),
            timeout_secs: 30,
        }
    }
}

pub struct GraphqlHostClient {
    client: Client,
    config: GraphqlHostConfig,
}

impl GraphqlHostClient {
    pub fn new(config: GraphqlHostConfig) -> Result<Self, HostError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HostError::NetworkError(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, HostError> {
        let mut request = self
            .client
            .post(&self.config.url)
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header("ApiKey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HostError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(HostError::NetworkError(format!("HTTP {}: {}", status, text)));
        }

        let body: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|e| HostError::InvalidResponse(e.to_string()))?;

        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(HostError::QueryError(messages.join("; ")));
        }
        body.data
            .ok_or_else(|| HostError::InvalidResponse("response has no data".to_string()))
    }
}

#[async_trait]
impl HostPort for GraphqlHostClient {
    async fn all_tags(&self) -> Result<Vec<HostTag>, HostError> {
        let data: AllTagsData = self.execute(ALL_TAGS_QUERY, Value::Null).await?;
        Ok(data
            .all_tags
            .into_iter()
            .map(|t| HostTag {
                id: t.id,
                name: t.name,
                children: t.children.into_iter().map(HostTagRef::from).collect(),
            })
            .collect())
    }

    async fn find_scenes_by_tags(&self, tag_ids: &[String], per_page: u32) -> Result<Vec<HostScene>, HostError> {
        let variables = json!({
            "filter": { "per_page": per_page },
            "scene_filter": {
                "tags": { "value": tag_ids, "modifier": "INCLUDES", "depth": -1 }
            }
        });
        let data: FindScenesData = self.execute(FIND_SCENES_QUERY, variables).await?;

        tracing::debug!(
            returned = data.find_scenes.scenes.len(),
            total = data.find_scenes.count,
            "FindScenes completed"
        );
        if data.find_scenes.count > data.find_scenes.scenes.len() as u64 {
            tracing::warn!(
                total = data.find_scenes.count,
                per_page,
                "More scenes than one page, remaining scenes are not processed"
            );
        }

        Ok(data.find_scenes.scenes.into_iter().map(HostScene::from).collect())
    }

    async fn scan_metadata(&self, paths: &[String]) -> Result<(), HostError> {
        let _: Value = self
            .execute(METADATA_SCAN_MUTATION, json!({ "input": { "paths": paths } }))
            .await?;
        tracing::info!(paths = ?paths, "Triggered metadata scan");
        Ok(())
    }

    async fn add_label(&self, scene_id: &str, label: &str) -> Result<(), HostError> {
        let tags = self.all_tags().await?;
        let label_id = tags
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(label))
            .map(|t| t.id)
            .ok_or_else(|| HostError::Missing(format!("'{}' tag not found - please create it", label)))?;

        let scene: FindSceneData = self
            .execute(FIND_SCENE_TAGS_QUERY, json!({ "id": scene_id }))
            .await?;
        let scene = scene
            .find_scene
            .ok_or_else(|| HostError::Missing(format!("scene not found: {}", scene_id)))?;

        let mut tag_ids: Vec<String> = scene.tags.into_iter().map(|t| t.id).collect();
        if tag_ids.contains(&label_id) {
            tracing::info!(scene_id = %scene_id, label = %label, "Scene already has label");
            return Ok(());
        }
        tag_ids.push(label_id);

        let _: Value = self
            .execute(
                SCENE_UPDATE_MUTATION,
                json!({ "input": { "id": scene_id, "tag_ids": tag_ids } }),
            )
            .await?;
        tracing::info!(scene_id = %scene_id, label = %label, "Label added to scene");
        Ok(())
    }

    async fn enqueue_task(&self, request: EnqueueRequest) -> Result<String, HostError> {
        let variables = json!({
            "plugin_id": self.config.plugin_id,
            "task_name": request.task_name,
            "description": request.description,
            "args_map": request.args,
        });
        let data: RunPluginTaskData = self.execute(RUN_PLUGIN_TASK_MUTATION, variables).await?;

        let job_id = match data.run_plugin_task {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => return Err(HostError::InvalidResponse(format!("unexpected job id: {}", other))),
        };
        tracing::debug!(job_id = %job_id, "Queued host job");
        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<Value>>>;

    async fn graphql(
        State(calls): State<Calls>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        assert_eq!(headers.get("ApiKey").and_then(|v| v.to_str().ok()), Some("secret"));
        calls.lock().unwrap().push(body.clone());
        let query = body["query"].as_str().unwrap_or_default();

        let data = if query.contains("allTags") {
            json!({ "allTags": [
                { "id": "1", "name": "Foreign Language", "children": [{ "id": "10", "name": "Japanese Language" }] },
                { "id": "2", "name": "Subtitled", "children": [] }
            ]})
        } else if query.contains("findScenes") {
            json!({ "findScenes": { "count": 1, "scenes": [{
                "id": "42",
                "title": null,
                "files": [{ "path": "/media/a.mp4", "duration": 61.5 }],
                "tags": [{ "id": "10", "name": "Japanese Language" }],
                "captions": null,
                "paths": { "caption": null }
            }]}})
        } else if query.contains("findScene") {
            let tags = if body["variables"]["id"] == "7" {
                json!([{ "id": "2", "name": "Subtitled" }])
            } else {
                json!([{ "id": "10", "name": "Japanese Language" }])
            };
            json!({ "findScene": { "id": body["variables"]["id"], "tags": tags } })
        } else if query.contains("runPluginTask") {
            json!({ "runPluginTask": "99" })
        } else if query.contains("metadataScan") {
            return Json(json!({ "data": null, "errors": [{ "message": "scan already running" }] }));
        } else {
            json!({ "sceneUpdate": { "id": body["variables"]["input"]["id"] } })
        };
        Json(json!({ "data": data }))
    }

    async fn client() -> (GraphqlHostClient, Calls) {
        let calls: Calls = Arc::default();
        let router = Router::new()
            .route("/graphql", post(graphql))
            .with_state(calls.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = GraphqlHostConfig {
            url: format!("http://{}/graphql", addr),
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        (GraphqlHostClient::new(config).unwrap(), calls)
    }

    #[tokio::test]
    async fn test_all_tags_and_scenes() {
        let (client, calls) = client().await;

        let tags = client.all_tags().await.unwrap();
        assert_eq!(tags[0].children[0].name, "Japanese Language");

        let scenes = client.find_scenes_by_tags(&["10".to_string()], 5000).await.unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].file_paths, vec!["/media/a.mp4".to_string()]);
        assert!(scenes[0].caption_languages.is_empty());
        assert_eq!(scenes[0].caption_path, None);

        let calls = calls.lock().unwrap();
        let filter = &calls[1]["variables"]["scene_filter"]["tags"];
        assert_eq!(filter["modifier"], "INCLUDES");
        assert_eq!(filter["depth"], -1);
        assert_eq!(calls[1]["variables"]["filter"]["per_page"], 5000);
    }

    #[tokio::test]
    async fn test_add_label_appends_tag() {
        let (client, calls) = client().await;
        client.add_label("42", "subtitled").await.unwrap();

        let calls = calls.lock().unwrap();
        let update = calls.last().unwrap();
        assert!(update["query"].as_str().unwrap().contains("sceneUpdate"));
        assert_eq!(update["variables"]["input"]["tag_ids"], json!(["10", "2"]));
    }

    #[tokio::test]
    async fn test_add_label_skips_when_present() {
        let (client, calls) = client().await;
        client.add_label("7", "Subtitled").await.unwrap();

        let calls = calls.lock().unwrap();
        assert!(!calls
            .iter()
            .any(|c| c["query"].as_str().unwrap_or_default().contains("sceneUpdate")));
    }

    #[tokio::test]
    async fn test_add_label_missing_tag() {
        let (client, _calls) = client().await;
        let err = client.add_label("42", "Captioned").await.unwrap_err();
        assert!(matches!(err, HostError::Missing(_)));
    }

    #[tokio::test]
    async fn test_graphql_errors_surface() {
        let (client, _calls) = client().await;
        let err = client.scan_metadata(&["/media/a.en.srt".to_string()]).await.unwrap_err();
        assert!(matches!(err, HostError::QueryError(msg) if msg == "scan already running"));
    }

    #[tokio::test]
    async fn test_enqueue_task() {
        let (client, calls) = client().await;
        let mut args = serde_json::Map::new();
        args.insert("mode".to_string(), json!("generate"));

        let job_id = client
            .enqueue_task(EnqueueRequest {
                task_name: "Generate Caption for Scene".to_string(),
                description: "Generating caption for /media/a.mp4".to_string(),
                args,
            })
            .await
            .unwrap();

        assert_eq!(job_id, "99");
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0]["variables"]["plugin_id"], "stash-auto-caption");
        assert_eq!(calls[0]["variables"]["args_map"]["mode"], "generate");
    }
}
