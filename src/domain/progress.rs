//! Progress Event - 转写进度事件
//!
//! 行分隔的 JSON 记录，`type` 字段区分三种事件：
//! progress（零到多条）之后紧跟恰好一条 complete 或 error。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress {
        /// 阶段内进度，时长未知时为 null
        progress: Option<f64>,
        /// 当前结果单元的结束时间（秒）
        timestamp: f64,
        duration: Option<f64>,
    },
    Complete {
        srt_content: String,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        language_probability: Option<f64>,
        #[serde(default)]
        duration: Option<f64>,
        #[serde(default)]
        segment_count: usize,
    },
    Error {
        error: String,
    },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Progress { .. })
    }

    /// 序列化为一行（含换行符）
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// 阶段内进度：end / duration，夹到 [0, 1]；时长未知时返回 None
pub fn local_progress(end_offset: f64, duration: Option<f64>) -> Option<f64> {
    match duration {
        Some(d) if d > 0.0 && d.is_finite() && end_offset.is_finite() => {
            Some((end_offset / d).clamp(0.0, 1.0))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_progress() {
        assert_eq!(local_progress(5.0, Some(10.0)), Some(0.5));
        assert_eq!(local_progress(12.0, Some(10.0)), Some(1.0));
        assert_eq!(local_progress(5.0, Some(0.0)), None);
        assert_eq!(local_progress(5.0, None), None);
    }

    #[test]
    fn test_wire_shape() {
        let event = ProgressEvent::Progress {
            progress: Some(0.5),
            timestamp: 5.0,
            duration: Some(10.0),
        };
        let line = event.to_line().unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["timestamp"], 5.0);
    }

    #[test]
    fn test_decode_engine_complete_record() {
        let raw = r#"{"type":"complete","srt_content":"1\n","language":"ja","language_probability":0.98,"duration":10.0,"segment_count":1}"#;
        let event: ProgressEvent = serde_json::from_str(raw).unwrap();
        assert!(event.is_terminal());
        match event {
            ProgressEvent::Complete { language, segment_count, .. } => {
                assert_eq!(language.as_deref(), Some("ja"));
                assert_eq!(segment_count, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
