//! HTTP Engine Client - 调用外部语音识别 HTTP 服务
//!
//! 实现 TranscriptionEnginePort trait
//!
//! 外部识别 API:
//! POST {base_url}/transcribe/srt?language=ja&task=transcribe&task_id=...
//! Request: 原始音频字节
//! Response:
//! - 带 task_id: application/x-ndjson，progress 记录若干条，最后一条 complete 或 error
//! - 不带 task_id: 单个 JSON {srt_content, language, language_probability, duration, segment_count}

use async_trait::async_trait;
use futures_util::{stream, StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::io::StreamReader;

use crate::application::ports::{
    EngineError, EngineEvent, EngineSummary, TimedUnit, TranscribeRequest, TranscriptionEnginePort,
    UnitStream,
};
use crate::domain::subtitle::parse_srt;
use crate::domain::ProgressEvent;

/// 一次性返回模式的响应体
#[derive(Debug, Deserialize)]
struct SrtResponse {
    srt_content: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    language_probability: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP 识别引擎客户端配置
#[derive(Debug, Clone)]
pub struct HttpEngineClientConfig {
    /// 识别服务基础 URL
    pub base_url: String,
    /// 单次识别请求的超时时间（秒），包含读取整个结果流
    pub timeout_secs: u64,
    /// 是否请求流式进度
    pub streaming: bool,
}

impl Default for HttpEngineClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://whisper-server:5000".to_string(),
            timeout_secs: 3600,
            streaming: true,
        }
    }
}

impl HttpEngineClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }
}

/// HTTP 识别引擎客户端
pub struct HttpEngineClient {
    client: Client,
    config: HttpEngineClientConfig,
}

impl HttpEngineClient {
    pub fn new(config: HttpEngineClientConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn transcribe_url(&self) -> String {
        format!("{}/transcribe/srt", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/", self.config.base_url.trim_end_matches('/'))
    }

    /// 流式模式：先读出第一条记录以获得媒体时长，再把它放回序列开头
    async fn read_stream(&self, response: Response) -> Result<UnitStream, EngineError> {
        let bytes = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let mut lines = StreamReader::new(Box::pin(bytes)).lines();

        let first = next_record_line(&mut lines).await?;
        let duration = first.as_deref().and_then(record_duration);

        Ok(UnitStream {
            duration,
            events: ndjson_events(lines, first).boxed(),
        })
    }

    async fn read_single(&self, response: Response) -> Result<UnitStream, EngineError> {
        let body: SrtResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ProtocolError(format!("Failed to parse response: {}", e)))?;

        let mut events: Vec<Result<EngineEvent, EngineError>> = parse_srt(&body.srt_content)
            .into_iter()
            .map(|cue| {
                Ok(EngineEvent::Unit(TimedUnit {
                    start: cue.start,
                    end: cue.end,
                    text: cue.text,
                }))
            })
            .collect();
        events.push(Ok(EngineEvent::Finished(EngineSummary {
            srt_content: Some(body.srt_content),
            language: body.language,
            language_probability: body.language_probability,
        })));

        Ok(UnitStream {
            duration: body.duration,
            events: stream::iter(events).boxed(),
        })
    }
}

fn map_request_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout
    } else if e.is_connect() {
        EngineError::NetworkError(format!("Cannot connect to transcription service: {}", e))
    } else {
        EngineError::NetworkError(e.to_string())
    }
}

/// 读取下一条非空行
async fn next_record_line<R>(lines: &mut Lines<R>) -> Result<Option<String>, EngineError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => return Ok(Some(line)),
            Ok(None) => return Ok(None),
            Err(e) => return Err(EngineError::NetworkError(format!("Stream read failed: {}", e))),
        }
    }
}

fn record_duration(line: &str) -> Option<f64> {
    match serde_json::from_str::<ProgressEvent>(line).ok()? {
        ProgressEvent::Progress { duration, .. } => duration,
        ProgressEvent::Complete { duration, .. } => duration,
        ProgressEvent::Error { .. } => None,
    }
}

/// 解析一条记录；progress 记录不带文本，起点取上一条的终点
fn decode_record(line: &str, last_end: &mut f64) -> Result<EngineEvent, EngineError> {
    let record: ProgressEvent = serde_json::from_str(line.trim())
        .map_err(|e| EngineError::ProtocolError(format!("Invalid record: {}", e)))?;

    match record {
        ProgressEvent::Progress { timestamp, .. } => {
            let start = *last_end;
            *last_end = timestamp.max(start);
            Ok(EngineEvent::Unit(TimedUnit {
                start,
                end: timestamp,
                text: String::new(),
            }))
        }
        ProgressEvent::Complete {
            srt_content,
            language,
            language_probability,
            ..
        } => Ok(EngineEvent::Finished(EngineSummary {
            srt_content: Some(srt_content),
            language,
            language_probability,
        })),
        ProgressEvent::Error { error } => Err(EngineError::ServiceError(error)),
    }
}

struct NdjsonState<R> {
    lines: Lines<R>,
    pending: Option<String>,
    last_end: f64,
    done: bool,
}

/// 按行惰性解析；遇到终止记录或错误后结束
fn ndjson_events<R>(
    lines: Lines<R>,
    first: Option<String>,
) -> impl futures_util::Stream<Item = Result<EngineEvent, EngineError>>
where
    R: AsyncBufRead + Unpin + Send,
{
    let state = NdjsonState {
        lines,
        pending: first,
        last_end: 0.0,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        let line = match state.pending.take() {
            Some(line) => line,
            None => match next_record_line(&mut state.lines).await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
            },
        };

        let item = decode_record(&line, &mut state.last_end);
        state.done = !matches!(item, Ok(EngineEvent::Unit(_)));
        Some((item, state))
    })
}

#[async_trait]
impl TranscriptionEnginePort for HttpEngineClient {
    async fn transcribe(&self, request: TranscribeRequest) -> Result<UnitStream, EngineError> {
        let audio = tokio::fs::read(&request.audio_path)
            .await
            .map_err(|e| EngineError::IoError(format!("{}: {}", request.audio_path.display(), e)))?;

        let streaming = self.config.streaming && request.task_id.is_some();
        let mut query: Vec<(&str, String)> = vec![("task", request.mode.as_str().to_string())];
        if let Some(language) = request.language.filter(|l| !l.is_empty()) {
            query.push(("language", language));
        }
        if streaming {
            if let Some(task_id) = request.task_id {
                query.push(("task_id", task_id));
            }
        }

        tracing::debug!(
            url = %self.transcribe_url(),
            audio_size = audio.len(),
            mode = request.mode.as_str(),
            streaming,
            "Sending transcription request"
        );

        let response = self
            .client
            .post(self.transcribe_url())
            .query(&query)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(EngineError::ServiceError(format!("HTTP {}: {}", status, message)));
        }

        if streaming {
            self.read_stream(response).await
        } else {
            self.read_single(response).await
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
