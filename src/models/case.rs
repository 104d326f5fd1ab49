use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::models::evaluation::ParsedEvaluation;
use crate::models::score::ScoreValue;

/// 控制台日志条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    /// 日志类型，例如 "log" / "warn" / "error"
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    /// 其余字段原样保留（message、timestamp 等）
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

impl ConsoleEntry {
    pub fn is_error(&self) -> bool {
        self.kind == "error"
    }
}

/// 单次人工评测（0–1 分制）
///
/// 类型不对的字段按缺失处理
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEvaluationEntry {
    #[serde(default, deserialize_with = "lenient_score")]
    pub functionality: Option<ScoreValue>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub visual_quality: Option<ScoreValue>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub code_quality: Option<ScoreValue>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub correction_cost: Option<ScoreValue>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub timestamp: Option<String>,
}

/// 人工评测字段：单条记录，或按时间顺序排列的修订历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManualEvaluationField {
    Revisions(Vec<ManualEvaluationEntry>),
    Single(ManualEvaluationEntry),
}

impl ManualEvaluationField {
    /// 从任意 JSON 构造：数组取其中的对象作为修订历史，对象作为单条记录，其他形状视为缺失
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Array(items) => Some(ManualEvaluationField::Revisions(
                items.into_iter().filter_map(entry_from_json).collect(),
            )),
            JsonValue::Object(_) => entry_from_json(value).map(ManualEvaluationField::Single),
            _ => None,
        }
    }

    /// 生效的人工评测：修订历史只取最后一条
    pub fn authoritative(&self) -> Option<&ManualEvaluationEntry> {
        match self {
            ManualEvaluationField::Revisions(entries) => entries.last(),
            ManualEvaluationField::Single(entry) => Some(entry),
        }
    }
}

/// 一次评测案例的快照
///
/// 由前端界面持有，每次导出时以只读形式传入
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCase {
    /// 评测 ID，可能是数字或字符串
    #[serde(default)]
    pub eval_id: Option<JsonValue>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub prompt: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub ground_truth: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub generated_code: String,
    /// 生成模型
    #[serde(default, deserialize_with = "nullable_string")]
    pub generator: String,
    /// 评审模型
    #[serde(default, deserialize_with = "nullable_string")]
    pub evaluator: String,
    /// 评审模型的原始输出
    #[serde(default)]
    pub evaluator_evaluation: Option<String>,
    #[serde(default)]
    pub parsed_evaluation: Option<ParsedEvaluation>,
    /// 旧格式的单一分数
    #[serde(default)]
    pub score: Option<ScoreValue>,
    /// 非数组视为缺失，非对象条目被丢弃
    #[serde(default, deserialize_with = "lenient_console")]
    pub console_output: Option<Vec<ConsoleEntry>>,
    #[serde(default, deserialize_with = "lenient_manual")]
    pub manual_evaluation: Option<ManualEvaluationField>,
    #[serde(default)]
    pub automated_executable: Option<bool>,
    #[serde(default)]
    pub automated_valid_output: Option<bool>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub retrieval_results: Vec<JsonValue>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub query_expansion: String,
    #[serde(default)]
    pub workflow: Option<JsonValue>,
    /// 本地保存时间
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl RawCase {
    /// 评测 ID 的字符串形式，缺失或为空时为 "0"
    pub fn eval_id_string(&self) -> String {
        let id = match &self.eval_id {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(JsonValue::Bool(b)) => b.to_string(),
            _ => String::new(),
        };
        if id.is_empty() {
            "0".to_string()
        } else {
            id
        }
    }

    /// 评审模型原始输出，缺失时为空串
    pub fn raw_output(&self) -> &str {
        self.evaluator_evaluation.as_deref().unwrap_or_default()
    }
}

/// 把 JSON 中的 `null` 当作空字符串
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn entry_from_json(value: JsonValue) -> Option<ManualEvaluationEntry> {
    match value {
        JsonValue::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

fn lenient_manual<'de, D>(deserializer: D) -> Result<Option<ManualEvaluationField>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.and_then(ManualEvaluationField::from_json))
}

fn lenient_console<'de, D>(deserializer: D) -> Result<Option<Vec<ConsoleEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::Array(items)) => Ok(Some(
            items
                .into_iter()
                .filter(JsonValue::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<ScoreValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::Number(n)) => n.as_f64().map(ScoreValue::Number),
        Some(JsonValue::String(s)) => Some(ScoreValue::Text(s)),
        _ => None,
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_opt_string(deserializer).map(Option::unwrap_or_default)
}

fn nullable_vec<'de, D>(deserializer: D) -> Result<Vec<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<JsonValue>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
