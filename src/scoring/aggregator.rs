//! 评测合并
//!
//! 把自动检查、LLM 评测和人工评测合并成一条统一的百分制记录。
//! 总分优先级：人工评测 > LLM 评测 > 0（人工修正直接覆盖模型判断，不做加权）。

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::case::{ManualEvaluationEntry, RawCase};
use crate::models::evaluation::{
    AutomatedChecks, CanonicalEvaluation, LlmDimension, LlmEvaluation, ManualEvaluation,
    ParsedEvaluation,
};
use crate::models::score::ScoreValue;
use crate::scoring::parser::{extract_score, parse_evaluation};
use crate::scoring::scale::{to_hundred, to_hundred_f64};

static UPPERCASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])").expect("valid uppercase regex"));

/// 合并一个案例的所有评测
///
/// # 参数
/// - `case`: 评测案例快照
/// - `parsed`: 已解析的评审输出（没有时尝试旧格式的单一分数）
pub fn aggregate(case: &RawCase, parsed: Option<&ParsedEvaluation>) -> CanonicalEvaluation {
    let automated_checks = automated_checks(case);
    let llm_evaluation = llm_evaluation(case, parsed);
    let manual_evaluation = case
        .manual_evaluation
        .as_ref()
        .and_then(|field| field.authoritative())
        .map(manual_evaluation);

    let overall_score = match (&manual_evaluation, &llm_evaluation) {
        (Some(manual), _) => manual.total_score as f64,
        (None, Some(llm)) => llm.overall_score,
        (None, None) => 0.0,
    };

    debug!(
        "评测合并完成: llm={}, manual={}, overall={}",
        llm_evaluation.is_some(),
        manual_evaluation.is_some(),
        overall_score
    );

    CanonicalEvaluation {
        automated_checks,
        llm_evaluation,
        manual_evaluation,
        overall_score,
    }
}

/// 案例对应的解析结果：优先使用前端已解析的结果，否则解析原始输出
pub fn resolve_parsed(case: &RawCase) -> Option<ParsedEvaluation> {
    case.parsed_evaluation
        .clone()
        .or_else(|| case.evaluator_evaluation.as_deref().and_then(parse_evaluation))
}

/// 旧格式的单一分数：案例中的 `score`，没有时从原始输出中提取 `<Score>`
pub fn legacy_score(case: &RawCase) -> Option<ScoreValue> {
    case.score
        .clone()
        .filter(ScoreValue::is_present)
        .or_else(|| {
            case.evaluator_evaluation
                .as_deref()
                .and_then(extract_score)
                .map(ScoreValue::Text)
                .filter(ScoreValue::is_present)
        })
}

/// camelCase → snake_case
pub fn to_snake_case(key: &str) -> String {
    let replaced = UPPERCASE.replace_all(key, "_$1").to_lowercase();
    replaced
        .strip_prefix('_')
        .map(str::to_string)
        .unwrap_or(replaced)
}

fn automated_checks(case: &RawCase) -> AutomatedChecks {
    AutomatedChecks {
        executable: case.automated_executable,
        has_output: case.automated_valid_output,
        error_count: case
            .console_output
            .as_ref()
            .map(|logs| logs.iter().filter(|entry| entry.is_error()).count())
            .unwrap_or(0),
    }
}

fn llm_evaluation(case: &RawCase, parsed: Option<&ParsedEvaluation>) -> Option<LlmEvaluation> {
    let raw_output = case.raw_output().to_string();

    if let Some(parsed) = parsed {
        let dimensions = parsed
            .dimensions
            .iter()
            .map(|(key, dim)| {
                (
                    to_snake_case(key),
                    LlmDimension {
                        score: to_hundred_f64(dim.score, 1).unwrap_or(0.0),
                        reason: dim.reason.clone(),
                    },
                )
            })
            .collect();

        return Some(LlmEvaluation {
            overall_score: to_hundred_f64(parsed.overall, 1).unwrap_or(0.0),
            dimensions,
            critique: parsed.critique.clone(),
            raw_output,
        });
    }

    legacy_score(case).map(|score| LlmEvaluation {
        overall_score: to_hundred(Some(&score), 1).unwrap_or(0.0),
        dimensions: Default::default(),
        critique: String::new(),
        raw_output,
    })
}

fn manual_evaluation(entry: &ManualEvaluationEntry) -> ManualEvaluation {
    let functionality = to_hundred(entry.functionality.as_ref(), 1).unwrap_or(0.0);
    let visual_quality = to_hundred(entry.visual_quality.as_ref(), 1).unwrap_or(0.0);
    let code_quality = to_hundred(entry.code_quality.as_ref(), 1).unwrap_or(0.0);
    let total_score = ((functionality + visual_quality + code_quality) / 3.0).round() as i64;

    ManualEvaluation {
        correction_cost: entry
            .correction_cost
            .as_ref()
            .and_then(ScoreValue::to_f64)
            .unwrap_or(0.0),
        functionality,
        visual_quality,
        code_quality,
        total_score,
        timestamp: entry.timestamp.clone().filter(|t| !t.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::case::ManualEvaluationField;
    use crate::models::evaluation::DimensionScore;
    use serde_json::json;

    fn manual(f: f64, v: f64, c: f64, cost: f64) -> ManualEvaluationEntry {
        ManualEvaluationEntry {
            functionality: Some(f.into()),
            visual_quality: Some(v.into()),
            code_quality: Some(c.into()),
            correction_cost: Some(cost.into()),
            timestamp: Some("2025-03-01T08:00:00.000Z".to_string()),
        }
    }

    fn parsed(overall: f64) -> ParsedEvaluation {
        let mut parsed = ParsedEvaluation {
            overall: Some(overall),
            critique: "fine".to_string(),
            ..Default::default()
        };
        parsed.dimensions.insert(
            "visualQuality".to_string(),
            DimensionScore { score: Some(0.55), reason: "dim".to_string() },
        );
        parsed.dimensions.insert("codeQuality".to_string(), DimensionScore::default());
        parsed
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("visualQuality"), "visual_quality");
        assert_eq!(to_snake_case("VisualQuality"), "visual_quality");
        assert_eq!(to_snake_case("functionality"), "functionality");
        assert_eq!(to_snake_case("codeQualityScore"), "code_quality_score");
    }

    #[test]
    fn test_manual_overrides_llm() {
        let case = RawCase {
            manual_evaluation: Some(ManualEvaluationField::Single(manual(0.5, 0.5, 0.5, 4.0))),
            ..Default::default()
        };
        let result = aggregate(&case, Some(&parsed(0.95)));

        assert_eq!(result.llm_evaluation.as_ref().unwrap().overall_score, 95.0);
        assert_eq!(result.manual_evaluation.as_ref().unwrap().total_score, 50);
        assert_eq!(result.overall_score, 50.0);
    }

    #[test]
    fn test_llm_dimensions_converted() {
        let case = RawCase {
            evaluator_evaluation: Some("<raw/>".to_string()),
            ..Default::default()
        };
        let result = aggregate(&case, Some(&parsed(0.8)));
        let llm = result.llm_evaluation.unwrap();

        assert_eq!(llm.overall_score, 80.0);
        assert_eq!(llm.dimensions["visual_quality"].score, 55.0);
        assert_eq!(llm.dimensions["code_quality"].score, 0.0);
        assert_eq!(llm.raw_output, "<raw/>");
        assert_eq!(llm.critique, "fine");
        assert_eq!(result.overall_score, 80.0);
    }

    #[test]
    fn test_latest_revision_wins() {
        let case = RawCase {
            manual_evaluation: Some(ManualEvaluationField::Revisions(vec![
                manual(0.1, 0.1, 0.1, 9.0),
                manual(0.4, 0.4, 0.4, 5.0),
                manual(0.9, 0.6, 0.6, 1.0),
            ])),
            ..Default::default()
        };
        let manual = aggregate(&case, None).manual_evaluation.unwrap();

        assert_eq!(manual.functionality, 90.0);
        assert_eq!(manual.visual_quality, 60.0);
        assert_eq!(manual.correction_cost, 1.0);
        assert_eq!(manual.total_score, 70);
    }

    #[test]
    fn test_empty_revision_list_is_absent() {
        let case = RawCase {
            manual_evaluation: Some(ManualEvaluationField::Revisions(Vec::new())),
            ..Default::default()
        };
        let result = aggregate(&case, None);
        assert!(result.manual_evaluation.is_none());
        assert_eq!(result.overall_score, 0.0);
    }

    #[test]
    fn test_error_count() {
        let case: RawCase = serde_json::from_value(json!({
            "consoleOutput": [
                {"type": "error", "message": "a"},
                {"type": "warn", "message": "b"},
                {"type": "error", "message": "c"},
                {"type": "Error", "message": "d"},
                {"message": "e"}
            ],
            "automatedExecutable": false
        }))
        .unwrap();
        let checks = aggregate(&case, None).automated_checks;

        assert_eq!(checks.error_count, 2);
        assert_eq!(checks.executable, Some(false));
        assert_eq!(checks.has_output, None);
        assert_eq!(aggregate(&RawCase::default(), None).automated_checks.error_count, 0);
    }

    #[test]
    fn test_legacy_score_fallback() {
        let case = RawCase {
            score: Some(ScoreValue::from("0.65")),
            ..Default::default()
        };
        let llm = aggregate(&case, None).llm_evaluation.unwrap();
        assert_eq!(llm.overall_score, 65.0);
        assert!(llm.dimensions.is_empty());
        assert_eq!(llm.critique, "");
    }

    #[test]
    fn test_zero_legacy_score_is_absent() {
        let case = RawCase {
            score: Some(ScoreValue::from(0.0)),
            ..Default::default()
        };
        assert!(aggregate(&case, None).llm_evaluation.is_none());
    }

    #[test]
    fn test_legacy_score_from_raw_text() {
        let case = RawCase {
            evaluator_evaluation: Some("Result: <Score>0.4</Score> (not xml)".to_string()),
            ..Default::default()
        };
        assert!(resolve_parsed(&case).is_none());
        let llm = aggregate(&case, None).llm_evaluation.unwrap();
        assert_eq!(llm.overall_score, 40.0);
    }

    #[test]
    fn test_resolve_parsed_prefers_stored() {
        let case = RawCase {
            parsed_evaluation: Some(parsed(0.3)),
            evaluator_evaluation: Some("<Evaluation><OverallScore>0.9</OverallScore></Evaluation>".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_parsed(&case).unwrap().overall, Some(0.3));

        let case = RawCase {
            evaluator_evaluation: case.evaluator_evaluation.clone(),
            ..Default::default()
        };
        assert_eq!(resolve_parsed(&case).unwrap().overall, Some(0.9));
    }
}
