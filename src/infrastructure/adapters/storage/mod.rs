//! Storage Adapter - 字幕文件存取

mod file_caption_store;

pub use file_caption_store::FileCaptionStore;
