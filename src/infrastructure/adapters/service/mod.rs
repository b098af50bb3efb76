//! Caption Service Adapter - 远程字幕服务客户端

mod http_caption_service_client;

pub use http_caption_service_client::*;
