//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：任务投递、单条目生成轮询、批量投递

mod batch_commands;
mod caption_commands;
mod generate_commands;

pub mod handlers;

pub use batch_commands::*;
pub use caption_commands::*;
pub use generate_commands::*;
