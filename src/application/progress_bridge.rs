//! Progress Bridge - 转写结果序列到任务状态的桥接
//!
//! 对引擎返回的结果序列只消费一次。每个结果单元：
//! 1. 累积为字幕
//! 2. 计算阶段内进度 end / duration
//! 3. 发布一条进度事件
//! 4. 写入任务存储
//!
//! 序列结束后发布一条 complete 事件；任何错误（包括空转写）都发布一条 error 事件并丢弃已累积内容。

use futures_util::StreamExt;

use crate::application::ports::{
    EngineError, EngineEvent, EngineSummary, ProgressEventPort, TaskStorePort, UnitStream,
};
use crate::domain::subtitle::{parse_srt, render_srt, SubtitleCue};
use crate::domain::{local_progress, ProgressEvent, ProgressPlan, TaskStage};

/// 转写阶段产出
#[derive(Debug, Clone)]
pub struct Transcript {
    pub cues: Vec<SubtitleCue>,
    pub srt_content: String,
    pub language: Option<String>,
    pub duration: Option<f64>,
    /// 引擎实际产出的结果单元数
    pub unit_count: usize,
}

pub struct ProgressBridge<'a> {
    task_id: &'a str,
    plan: ProgressPlan,
    store: &'a dyn TaskStorePort,
    events: &'a dyn ProgressEventPort,
}

impl<'a> ProgressBridge<'a> {
    pub fn new(
        task_id: &'a str,
        plan: ProgressPlan,
        store: &'a dyn TaskStorePort,
        events: &'a dyn ProgressEventPort,
    ) -> Self {
        Self {
            task_id,
            plan,
            store,
            events,
        }
    }

    /// 消费结果序列直到终止
    pub async fn consume(&self, stream: UnitStream) -> Result<Transcript, EngineError> {
        let UnitStream { duration, mut events } = stream;
        let duration = duration.filter(|d| d.is_finite() && *d > 0.0);
        if let Some(d) = duration {
            self.store.set_duration(self.task_id, d);
        }

        let mut cues: Vec<SubtitleCue> = Vec::new();
        let mut summary: Option<EngineSummary> = None;

        while let Some(item) = events.next().await {
            match item {
                Ok(EngineEvent::Unit(unit)) => {
                    let local = local_progress(unit.end, duration);
                    cues.push(SubtitleCue {
                        index: cues.len() + 1,
                        start: unit.start,
                        end: unit.end,
                        text: unit.text.trim().to_string(),
                    });

                    self.events.publish(
                        self.task_id,
                        ProgressEvent::Progress {
                            progress: local,
                            timestamp: unit.end,
                            duration,
                        },
                    );
                    self.store.update_progress(
                        self.task_id,
                        self.plan.overall(TaskStage::Transcribing, local.unwrap_or(0.0)),
                        unit.end,
                    );
                }
                Ok(EngineEvent::Finished(s)) => {
                    summary = Some(s);
                    break;
                }
                Err(e) => return Err(self.abort(e)),
            }
        }

        let Some(summary) = summary else {
            return Err(self.abort(EngineError::Truncated));
        };

        let unit_count = cues.len();
        let (cues, srt_content) = match summary.srt_content {
            Some(srt) if !srt.trim().is_empty() => (parse_srt(&srt), srt),
            _ => {
                let srt = render_srt(&cues);
                (cues, srt)
            }
        };

        if cues.is_empty() || srt_content.trim().is_empty() {
            return Err(self.abort(EngineError::EmptyTranscript));
        }

        tracing::info!(
            task_id = %self.task_id,
            units = unit_count,
            cues = cues.len(),
            language = ?summary.language,
            "Transcription stream complete"
        );

        self.events.publish(
            self.task_id,
            ProgressEvent::Complete {
                srt_content: srt_content.clone(),
                language: summary.language.clone(),
                language_probability: summary.language_probability,
                duration,
                segment_count: cues.len(),
            },
        );

        Ok(Transcript {
            cues,
            srt_content,
            language: summary.language,
            duration,
            unit_count,
        })
    }

    fn abort(&self, error: EngineError) -> EngineError {
        tracing::error!(task_id = %self.task_id, error = %error, "Transcription stream failed");
        self.events.publish(
            self.task_id,
            ProgressEvent::Error {
                error: error.to_string(),
            },
        );
        error
    }
}
