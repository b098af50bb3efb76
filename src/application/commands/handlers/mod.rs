//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod batch_handlers;
mod caption_handlers;
mod generate_handlers;

pub use batch_handlers::*;
pub use caption_handlers::*;
pub use generate_handlers::*;
