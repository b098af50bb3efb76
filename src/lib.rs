//! Autocaption - 自动字幕生成系统
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Task Context: 字幕任务状态机、阶段权重
//! - Subtitle Context: SRT 格式与文件命名
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TaskStore, TranscriptionEngine, Translator, CaptionService, Host）
//! - Commands: 启动任务、轮询客户端、批处理调度
//! - Queries: 任务状态与结果查询
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + NDJSON 事件流
//! - Memory: TaskStore 内存实现
//! - Worker: CaptionWorker 后台任务处理
//! - Adapters: 识别引擎、翻译、ffmpeg、字幕文件、字幕服务、宿主 GraphQL
//! - Events: 进度事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
