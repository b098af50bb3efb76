//! Fake Engine - 用于测试的识别引擎
//!
//! 按配置的结果单元依次产出，不实际调用识别服务

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use std::sync::Mutex;

use crate::application::ports::{
    EngineError, EngineEvent, EngineMode, EngineSummary, TimedUnit, TranscribeRequest,
    TranscriptionEnginePort, UnitStream,
};

/// Fake Engine 配置
#[derive(Debug, Clone)]
pub struct FakeEngineConfig {
    pub duration: Option<f64>,
    pub units: Vec<TimedUnit>,
    /// 产出这么多个单元后返回错误
    pub fail_after: Option<usize>,
    pub language: Option<String>,
}

impl Default for FakeEngineConfig {
    fn default() -> Self {
        Self {
            duration: Some(10.0),
            units: (1..=5)
                .map(|i| TimedUnit {
                    start: (i - 1) as f64 * 2.0,
                    end: i as f64 * 2.0,
                    text: format!("line {}", i),
                })
                .collect(),
            fail_after: None,
            language: Some("ja".to_string()),
        }
    }
}

/// Fake Engine
pub struct FakeEngine {
    config: FakeEngineConfig,
    requests: Mutex<Vec<(Option<String>, EngineMode)>>,
}

impl FakeEngine {
    pub fn new(config: FakeEngineConfig) -> Self {
        Self {
            config,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的请求（语言, 模式）
    pub fn requests(&self) -> Vec<(Option<String>, EngineMode)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranscriptionEnginePort for FakeEngine {
    async fn transcribe(&self, request: TranscribeRequest) -> Result<UnitStream, EngineError> {
        tracing::debug!(
            task_id = ?request.task_id,
            mode = request.mode.as_str(),
            "FakeEngine: returning scripted units"
        );
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((request.language.clone(), request.mode));
        }

        let mut events: Vec<Result<EngineEvent, EngineError>> = Vec::new();
        for (i, unit) in self.config.units.iter().enumerate() {
            if self.config.fail_after == Some(i) {
                events.push(Err(EngineError::ServiceError("fake engine failure".to_string())));
                break;
            }
            events.push(Ok(EngineEvent::Unit(unit.clone())));
        }
        if self.config.fail_after.map_or(true, |n| n >= self.config.units.len()) {
            events.push(Ok(EngineEvent::Finished(EngineSummary {
                srt_content: None,
                language: request.language.or_else(|| self.config.language.clone()),
                language_probability: Some(1.0),
            })));
        }

        Ok(UnitStream {
            duration: self.config.duration,
            events: stream::iter(events).boxed(),
        })
    }
}
