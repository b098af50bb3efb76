//! SRT 字幕格式
//!
//! 时间戳格式 `HH:MM:SS,mmm`，cue 之间以空行分隔

use serde::{Deserialize, Serialize};

/// 单条字幕
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// 秒 -> `HH:MM:SS,mmm`
pub fn format_timestamp(seconds: f64) -> String {
    let total_millis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).floor() as u64
    } else {
        0
    };
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// `HH:MM:SS,mmm` -> 秒
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let (clock, millis) = raw.split_once([',', '.'])?;
    let mut parts = clock.split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let secs: u64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let millis: u64 = millis.trim().parse().ok()?;
    Some((hours * 3600 + minutes * 60 + secs) as f64 + millis as f64 / 1000.0)
}

/// 渲染为 SRT 文本
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut lines = Vec::with_capacity(cues.len() * 4);
    for cue in cues {
        lines.push(cue.index.to_string());
        lines.push(format!(
            "{} --> {}",
            format_timestamp(cue.start),
            format_timestamp(cue.end)
        ));
        lines.push(cue.text.trim().to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

/// 解析 SRT 文本，跳过无法解析的块
pub fn parse_srt(content: &str) -> Vec<SubtitleCue> {
    let normalized = content.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in normalized.trim().split("\n\n") {
        let lines: Vec<&str> = block.trim().lines().collect();
        if lines.len() < 3 {
            continue;
        }
        let Ok(index) = lines[0].trim().parse::<usize>() else {
            tracing::debug!(block = %block, "Skipping SRT block with invalid index");
            continue;
        };
        let Some((start, end)) = lines[1].split_once("-->") else {
            continue;
        };
        let (Some(start), Some(end)) = (parse_timestamp(start), parse_timestamp(end)) else {
            continue;
        };
        cues.push(SubtitleCue {
            index,
            start,
            end,
            text: lines[2..].join("\n"),
        });
    }

    cues
}

/// 将翻译结果按行对齐到原 cue 数量，多退少补
pub fn align_lines(translated: &str, expected: usize) -> Vec<String> {
    let mut lines: Vec<String> = translated.split('\n').map(str::to_string).collect();
    if lines.len() != expected {
        tracing::warn!(
            expected = expected,
            actual = lines.len(),
            "Translation line count mismatch, adjusting"
        );
    }
    lines.resize(expected, String::new());
    lines
}
