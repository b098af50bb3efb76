//! Generate Commands - 单条目字幕生成（启动 + 轮询）

use std::time::Duration;

use crate::application::error::GenerateError;
use crate::domain::{language, CaptionResult};

/// 生成字幕命令（来自宿主任务参数或命令行）
#[derive(Debug, Clone, Default)]
pub struct GenerateCaption {
    /// 宿主条目 id，为空时跳过打标签
    pub scene_id: Option<String>,
    pub video_path: String,
    /// 源语言，空字符串或 "auto" 表示自动识别
    pub language: String,
    pub translate_to: Option<String>,
    /// 字幕服务地址，为空时使用配置
    pub service_url: Option<String>,
    /// 成功后的冷却时间（秒）
    pub cooldown_secs: u64,
}

/// 校验后的参数
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateParams {
    pub scene_id: Option<String>,
    pub video_path: String,
    pub language: String,
    pub translate_to: Option<String>,
    pub service_url: String,
    pub cooldown: Duration,
}

impl GenerateParams {
    /// 在发起任何请求之前校验参数
    pub fn validate(cmd: GenerateCaption, default_service_url: &str) -> Result<Self, GenerateError> {
        let video_path = cmd.video_path.trim().to_string();
        if video_path.is_empty() {
            return Err(GenerateError::Precondition("video_path is required".to_string()));
        }

        let language = match cmd.language.trim().to_lowercase().as_str() {
            "" | "auto" => String::new(),
            code if language::is_supported(code) => code.to_string(),
            other => {
                return Err(GenerateError::Precondition(format!(
                    "unsupported language: {}",
                    other
                )))
            }
        };

        let translate_to = cmd
            .translate_to
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        if let Some(target) = translate_to.as_deref() {
            if !language::is_supported(target) {
                return Err(GenerateError::Precondition(format!(
                    "unsupported translate_to: {}",
                    target
                )));
            }
        }

        let service_url = cmd
            .service_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| default_service_url.to_string());
        if service_url.is_empty() {
            return Err(GenerateError::Precondition("service_url is required".to_string()));
        }

        Ok(Self {
            scene_id: cmd.scene_id.filter(|id| !id.trim().is_empty()),
            video_path,
            language,
            translate_to,
            service_url,
            cooldown: Duration::from_secs(cmd.cooldown_secs),
        })
    }
}

/// 生成结果
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub task_id: String,
    pub result: Option<CaptionResult>,
}
