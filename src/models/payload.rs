//! 导出数据
//!
//! 字段名与后端导出接口保持兼容（snake_case + 少量 camelCase 历史字段）

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::case::{ConsoleEntry, RawCase};
use crate::models::evaluation::{AutomatedChecks, CanonicalEvaluation, LlmEvaluation, ManualEvaluation};

/// 一次导出提交的完整数据，提交后即丢弃
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPayload {
    /// 后端使用的评测 ID 字段
    #[serde(rename = "evalId")]
    pub eval_id: String,
    pub evaluation_id: String,
    pub timestamp: String,
    pub prompt: String,
    pub generator_model: String,
    pub evaluator_model: String,
    pub automated_checks: AutomatedChecks,
    pub llm_evaluation: Option<LlmEvaluation>,
    pub manual_evaluation: Option<ManualEvaluation>,
    pub overall_score: f64,
    pub retrieval_results: Vec<JsonValue>,
    pub query_expansion: String,
    pub console_output: Vec<ConsoleEntry>,
    pub generated_code: String,
    pub ground_truth: String,
    pub workflow: JsonValue,
    /// 生成代码预览截图（data URL），截图失败时为 null，但字段始终存在
    #[serde(rename = "generatedImage")]
    pub generated_image: Option<String>,
    /// Ground truth 预览截图
    #[serde(rename = "truthImage")]
    pub truth_image: Option<String>,
    pub export_time: String,
}

/// 两张预览截图
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewImages {
    pub generated: Option<String>,
    pub truth: Option<String>,
}

impl ExportPayload {
    /// 合并评测记录、截图和导出时间
    pub fn assemble(
        case: &RawCase,
        evaluation: CanonicalEvaluation,
        images: PreviewImages,
        evaluated_at: DateTime<Utc>,
        exported_at: DateTime<Utc>,
    ) -> Self {
        let eval_id = case.eval_id_string();
        Self {
            evaluation_id: eval_id.clone(),
            eval_id,
            timestamp: iso_timestamp(evaluated_at),
            prompt: case.prompt.clone(),
            generator_model: case.generator.clone(),
            evaluator_model: case.evaluator.clone(),
            automated_checks: evaluation.automated_checks,
            llm_evaluation: evaluation.llm_evaluation,
            manual_evaluation: evaluation.manual_evaluation,
            overall_score: evaluation.overall_score,
            retrieval_results: case.retrieval_results.clone(),
            query_expansion: case.query_expansion.clone(),
            console_output: case.console_output.clone().unwrap_or_default(),
            generated_code: case.generated_code.clone(),
            ground_truth: case.ground_truth.clone(),
            workflow: case.workflow.clone().unwrap_or(JsonValue::Null),
            generated_image: images.generated,
            truth_image: images.truth,
            export_time: iso_timestamp(exported_at),
        }
    }
}

/// 提交接口的确认
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub success: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

impl SubmitAck {
    /// 服务端附带的提示信息（如果有）
    pub fn message(&self) -> String {
        self.extra
            .get("message")
            .or_else(|| self.extra.get("error"))
            .and_then(JsonValue::as_str)
            .unwrap_or("success != true")
            .to_string()
    }
}

/// ISO-8601 时间戳（毫秒精度，UTC，`Z` 结尾）
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
