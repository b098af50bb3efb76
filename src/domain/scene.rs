//! Scene Candidate - 批处理中的单个候选条目

use serde::Serialize;

/// 已有字幕的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPresence {
    /// 元数据与文件都在
    Present,
    /// 只有元数据（文件缺失），视为已处理
    MetadataOnly,
    /// 文件在但宿主未索引，需要修复
    NeedsRepair,
    /// 两者都没有，需要生成
    Missing,
}

/// 语言标签（宿主标签 id + 语言代码）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTag {
    pub tag_id: String,
    pub name: String,
    pub code: String,
}

/// 候选条目，仅在一次批处理中存在
#[derive(Debug, Clone)]
pub struct SceneCandidate {
    pub id: String,
    pub title: Option<String>,
    /// 首个可播放文件路径
    pub media_path: Option<String>,
    pub tag_ids: Vec<String>,
    pub existing_caption_metadata: bool,
    pub existing_caption_file: bool,
    /// 空字符串表示交给引擎自动识别
    pub detected_language: String,
}

impl SceneCandidate {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("Unknown")
    }

    pub fn caption_presence(&self) -> CaptionPresence {
        match (self.existing_caption_metadata, self.existing_caption_file) {
            (true, true) => CaptionPresence::Present,
            (true, false) => CaptionPresence::MetadataOnly,
            (false, true) => CaptionPresence::NeedsRepair,
            (false, false) => CaptionPresence::Missing,
        }
    }
}

/// 从条目标签推断语言：恰好命中一个语言标签时返回其代码，否则返回空串
pub fn detect_language(tag_ids: &[String], language_tags: &[LanguageTag]) -> String {
    let mut codes: Vec<&str> = language_tags
        .iter()
        .filter(|lt| tag_ids.iter().any(|id| *id == lt.tag_id))
        .map(|lt| lt.code.as_str())
        .collect();
    codes.sort_unstable();
    codes.dedup();
    match codes.as_slice() {
        [code] => (*code).to_string(),
        _ => String::new(),
    }
}
