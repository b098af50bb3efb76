//! Media Adapter - 音轨提取

mod ffmpeg_extractor;

pub use ffmpeg_extractor::*;
