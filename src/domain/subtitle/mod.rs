//! Subtitle Context - 字幕格式与命名

mod naming;
mod srt;

pub use naming::{artifact_path, media_stem, CaptionFileMatcher};
pub use srt::{align_lines, format_timestamp, parse_srt, parse_timestamp, render_srt, SubtitleCue};
