//! Memory Layer - In-Memory State Management
//!
//! 实现 TaskStore，管理字幕任务的内存状态

mod task_store;

pub use task_store::InMemoryTaskStore;
