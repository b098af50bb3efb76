//! 字幕文件命名规则

use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};

use crate::domain::language::name_for_code;

/// 媒体文件同目录下的字幕输出路径：`<stem>.<lang>.srt`
pub fn artifact_path(media_path: &Path, language: &str) -> PathBuf {
    let stem = media_stem(media_path);
    let file_name = format!("{}.{}.srt", stem, language);
    match media_path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

pub fn media_stem(media_path: &Path) -> String {
    media_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 匹配已有字幕文件名
///
/// 接受 `movie.en.srt`、`movie.english.srt`、`movie.es.forced.srt` 等形式，忽略大小写。
#[derive(Debug, Clone)]
pub struct CaptionFileMatcher {
    simple: Regex,
    tagged: Regex,
}

impl CaptionFileMatcher {
    pub fn new(stem: &str, language: &str) -> Result<Self, regex::Error> {
        let stem = regex::escape(stem);
        let language = match name_for_code(language) {
            Some(name) => format!("(?:{}|{})", regex::escape(language), regex::escape(name)),
            None => regex::escape(language),
        };
        let simple = RegexBuilder::new(&format!(r"^{}\.{}\.srt$", stem, language))
            .case_insensitive(true)
            .build()?;
        let tagged = RegexBuilder::new(&format!(r"^{}.*\.{}\..*\.srt$", stem, language))
            .case_insensitive(true)
            .build()?;
        Ok(Self { simple, tagged })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.simple.is_match(file_name) || self.tagged.is_match(file_name)
    }
}
