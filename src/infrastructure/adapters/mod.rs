//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod engine;
pub mod host;
pub mod media;
pub mod service;
pub mod sink;
pub mod storage;
pub mod translation;

pub use engine::*;
pub use host::*;
pub use media::*;
pub use service::*;
pub use sink::*;
pub use storage::*;
pub use translation::*;
