//! Translation Adapter - 二次翻译服务实现

mod libre_translate_client;

pub use libre_translate_client::*;
