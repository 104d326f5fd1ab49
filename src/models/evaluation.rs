//! 评测结果模型
//!
//! - `ParsedEvaluation`：评审模型输出解析后的结构（0–1 分制）
//! - `CanonicalEvaluation`：自动检查 + LLM 评测 + 人工评测合并后的统一记录（百分制）

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 单个维度的分数和理由（0–1 分制）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionScore {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "crate::models::case::nullable_string")]
    pub reason: String,
}

/// 评审模型输出的解析结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedEvaluation {
    /// 维度名 → 分数
    #[serde(default)]
    pub dimensions: BTreeMap<String, DimensionScore>,
    /// 总分，缺失时为 `None`
    #[serde(default)]
    pub overall: Option<f64>,
    /// 评语
    #[serde(default, deserialize_with = "crate::models::case::nullable_string")]
    pub critique: String,
}

/// 自动检查结果
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AutomatedChecks {
    pub executable: Option<bool>,
    pub has_output: Option<bool>,
    pub error_count: usize,
}

/// LLM 评测中的单个维度（百分制）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmDimension {
    pub score: f64,
    pub reason: String,
}

/// LLM 评测（百分制）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmEvaluation {
    pub overall_score: f64,
    /// snake_case 维度名 → 分数
    pub dimensions: BTreeMap<String, LlmDimension>,
    pub critique: String,
    pub raw_output: String,
}

/// 人工评测（百分制）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEvaluation {
    pub correction_cost: f64,
    pub functionality: f64,
    pub visual_quality: f64,
    pub code_quality: f64,
    /// 三项子分的平均值，四舍五入为整数
    pub total_score: i64,
    pub timestamp: Option<String>,
}

/// 合并后的评测记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvaluation {
    pub automated_checks: AutomatedChecks,
    pub llm_evaluation: Option<LlmEvaluation>,
    pub manual_evaluation: Option<ManualEvaluation>,
    /// 人工评测优先，其次 LLM 评测，都没有时为 0
    pub overall_score: f64,
}
