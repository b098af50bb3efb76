//! Host Port - 宿主媒体库
//!
//! 宿主负责标签、条目元数据与任务队列；这里只定义调用边界

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Host returned errors: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Missing(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTagRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTag {
    pub id: String,
    pub name: String,
    pub children: Vec<HostTagRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostScene {
    pub id: String,
    pub title: Option<String>,
    /// 媒体文件路径，第一个为主文件
    pub file_paths: Vec<String>,
    pub tags: Vec<HostTagRef>,
    /// 宿主已登记的字幕语言
    pub caption_languages: Vec<String>,
    /// 宿主记录的字幕路径
    pub caption_path: Option<String>,
}

/// 宿主任务投递请求
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub task_name: String,
    pub description: String,
    pub args: Map<String, Value>,
}

#[async_trait]
pub trait HostPort: Send + Sync {
    async fn all_tags(&self) -> Result<Vec<HostTag>, HostError>;

    /// 查询带有任一标签（含子标签）的条目
    async fn find_scenes_by_tags(&self, tag_ids: &[String], per_page: u32) -> Result<Vec<HostScene>, HostError>;

    /// 触发宿主重新索引指定文件
    async fn scan_metadata(&self, paths: &[String]) -> Result<(), HostError>;

    /// 给条目加标签（已存在时视为成功）
    async fn add_label(&self, scene_id: &str, label: &str) -> Result<(), HostError>;

    /// 投递宿主任务，返回任务 id
    async fn enqueue_task(&self, request: EnqueueRequest) -> Result<String, HostError>;
}
