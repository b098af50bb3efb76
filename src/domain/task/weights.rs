//! Stage Weights - 阶段权重表
//!
//! 将每个流水线阶段映射到总体进度中的一个子区间：
//! overall = stage_offset + stage_local * stage_weight

use serde::{Deserialize, Serialize};

use super::TaskStage;

const WEIGHT_EPSILON: f64 = 1e-6;

/// 翻译路径，每个任务只选择一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationPath {
    /// 不需要翻译
    None,
    /// 引擎在转写时直接翻译为规范语言
    Engine,
    /// 转写后交给独立翻译服务
    Secondary,
}

impl TranslationPath {
    /// 选择翻译路径
    ///
    /// 目标语言为空或与源语言相同时不翻译；目标为规范语言时由引擎翻译；
    /// 其余情况走二次翻译。
    pub fn choose(source: &str, target: Option<&str>, canonical: &str) -> Self {
        match target {
            None => TranslationPath::None,
            Some(t) if t.is_empty() || t.eq_ignore_ascii_case(source) => TranslationPath::None,
            Some(t) if t.eq_ignore_ascii_case(canonical) => TranslationPath::Engine,
            Some(_) => TranslationPath::Secondary,
        }
    }
}

/// 阶段权重
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageWeights {
    pub extract: f64,
    pub transcribe: f64,
    pub translate: f64,
    pub persist: f64,
}

impl StageWeights {
    /// 二次翻译路径（同时用于无翻译的任务）
    pub const SECONDARY: StageWeights = StageWeights {
        extract: 0.10,
        transcribe: 0.65,
        translate: 0.20,
        persist: 0.05,
    };

    /// 引擎直接翻译路径
    pub const ENGINE_TRANSLATED: StageWeights = StageWeights {
        extract: 0.10,
        transcribe: 0.85,
        translate: 0.0,
        persist: 0.05,
    };

    pub fn total(&self) -> f64 {
        self.extract + self.transcribe + self.translate + self.persist
    }

    /// 每个权重必须在 [0, 1] 内且总和为 1
    pub fn validate(&self) -> Result<(), String> {
        for (name, w) in [
            ("extract", self.extract),
            ("transcribe", self.transcribe),
            ("translate", self.translate),
            ("persist", self.persist),
        ] {
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(format!("stage weight '{}' must be within [0, 1], got {}", name, w));
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_EPSILON {
            return Err(format!("stage weights must sum to 1.0, got {}", total));
        }
        Ok(())
    }

    pub fn weight(&self, stage: TaskStage) -> f64 {
        match stage {
            TaskStage::ExtractingAudio => self.extract,
            TaskStage::Transcribing => self.transcribe,
            TaskStage::Translating => self.translate,
            TaskStage::Saving => self.persist,
        }
    }

    /// 阶段起始偏移（之前所有阶段权重之和）
    pub fn offset(&self, stage: TaskStage) -> f64 {
        match stage {
            TaskStage::ExtractingAudio => 0.0,
            TaskStage::Transcribing => self.extract,
            TaskStage::Translating => self.extract + self.transcribe,
            TaskStage::Saving => self.extract + self.transcribe + self.translate,
        }
    }
}

impl Default for StageWeights {
    fn default() -> Self {
        Self::SECONDARY
    }
}

/// 单个任务的进度计划
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPlan {
    pub path: TranslationPath,
    pub weights: StageWeights,
}

impl ProgressPlan {
    pub fn new(path: TranslationPath, secondary: StageWeights, engine_translated: StageWeights) -> Self {
        let weights = match path {
            TranslationPath::Engine => engine_translated,
            TranslationPath::None | TranslationPath::Secondary => secondary,
        };
        Self { path, weights }
    }

    pub fn entry(&self, stage: TaskStage) -> f64 {
        self.weights.offset(stage)
    }

    pub fn overall(&self, stage: TaskStage, local: f64) -> f64 {
        let local = if local.is_finite() { local.clamp(0.0, 1.0) } else { 0.0 };
        self.weights.offset(stage) + local * self.weights.weight(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    const ALL_STAGES: [TaskStage; 4] = [
        TaskStage::ExtractingAudio,
        TaskStage::Transcribing,
        TaskStage::Translating,
        TaskStage::Saving,
    ];

    #[test]
    fn test_default_tables_are_valid() {
        assert!(StageWeights::SECONDARY.validate().is_ok());
        assert!(StageWeights::ENGINE_TRANSLATED.validate().is_ok());
    }

    #[test]
    fn test_rejects_table_not_summing_to_one() {
        let weights = StageWeights {
            extract: 0.1,
            transcribe: 0.5,
            translate: 0.1,
            persist: 0.1,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_choose_translation_path() {
        assert_eq!(TranslationPath::choose("ja", None, "en"), TranslationPath::None);
        assert_eq!(TranslationPath::choose("en", Some("en"), "en"), TranslationPath::None);
        assert_eq!(TranslationPath::choose("ja", Some("en"), "en"), TranslationPath::Engine);
        assert_eq!(TranslationPath::choose("en", Some("fr"), "en"), TranslationPath::Secondary);
    }

    #[test]
    fn test_stage_ranges_reach_one_on_both_paths() {
        for path in [TranslationPath::Secondary, TranslationPath::Engine, TranslationPath::None] {
            let plan = ProgressPlan::new(path, StageWeights::SECONDARY, StageWeights::ENGINE_TRANSLATED);
            assert!(approx(plan.overall(TaskStage::Saving, 1.0), 1.0), "path {:?}", path);

            let mut previous = 0.0;
            for stage in ALL_STAGES {
                assert!(plan.entry(stage) >= previous);
                previous = plan.overall(stage, 1.0);
            }
        }
    }

    #[test]
    fn test_transcribe_progress_on_secondary_path() {
        let plan = ProgressPlan::new(
            TranslationPath::None,
            StageWeights::SECONDARY,
            StageWeights::ENGINE_TRANSLATED,
        );
        assert!(approx(plan.entry(TaskStage::Transcribing), 0.10));
        assert!(approx(plan.overall(TaskStage::Transcribing, 0.2), 0.23));
        assert!(approx(plan.overall(TaskStage::Transcribing, 1.0), 0.75));
    }

    #[test]
    fn test_engine_path_skips_translation_stage() {
        let plan = ProgressPlan::new(
            TranslationPath::Engine,
            StageWeights::SECONDARY,
            StageWeights::ENGINE_TRANSLATED,
        );
        assert!(approx(plan.overall(TaskStage::Transcribing, 1.0), 0.95));
        assert!(approx(plan.entry(TaskStage::Translating), plan.entry(TaskStage::Saving)));
    }
}
