//! Batch Commands - 批量发现并投递字幕任务

use serde::Serialize;
use std::time::Duration;

/// 批处理配置
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// 语言标签的父标签名
    pub parent_tag: String,
    pub subtitled_label: String,
    /// 单次最多投递的条目数
    pub max_batch_size: usize,
    /// 条目查询页大小，超出部分不处理
    pub page_size: u32,
    /// 投递给每个任务的冷却提示（秒）
    pub cooldown_secs: u64,
    /// 相邻两次投递之间的间隔
    pub submit_interval: Duration,
    /// 同一次运行内按条目 id 去重
    pub dedupe_within_run: bool,
    pub translate_to: String,
    pub service_url: String,
    pub task_name: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parent_tag: "Foreign Language".to_string(),
            subtitled_label: "Subtitled".to_string(),
            max_batch_size: 20,
            page_size: 5000,
            cooldown_secs: 10,
            submit_interval: Duration::ZERO,
            dedupe_within_run: false,
            translate_to: "en".to_string(),
            service_url: "http://auto-caption-web:8000".to_string(),
            task_name: "Generate Caption for Scene".to_string(),
        }
    }
}

/// 批处理命令
#[derive(Debug, Clone, Default)]
pub struct QueueBatch {
    /// 覆盖配置中的批大小
    pub max_batch_size: Option<usize>,
}

/// 批处理汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// 查询到的条目数
    pub discovered: usize,
    /// 已有字幕而跳过的条目数
    pub filtered: usize,
    /// 走修复路径（重新索引）的条目数
    pub repaired: usize,
    /// 需要生成字幕的条目数（截断前）
    pub eligible: usize,
    pub queued: usize,
    pub failed: usize,
    /// 因批大小上限推迟到下次运行的条目数
    pub deferred: usize,
}
