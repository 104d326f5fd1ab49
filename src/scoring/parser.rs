//! 评审模型输出解析
//!
//! 评审模型按约定返回如下结构（不保证格式正确）：
//!
//! ```text
//! <Evaluation>
//!   <Dimension name="functionality">
//!     <Score>0.8</Score>
//!     <Reason>...</Reason>
//!   </Dimension>
//!   ...
//!   <OverallScore>0.75</OverallScore>
//!   <Critique>...</Critique>
//! </Evaluation>
//! ```
//!
//! 解析失败时返回 `None`，不会中断导出流程。

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::models::evaluation::{DimensionScore, ParsedEvaluation};
use crate::models::score::parse_float_prefix;

static LEGACY_SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Score>(.*?)</Score>").expect("valid legacy score regex"));

/// 解析评审模型的 XML 输出
///
/// # 参数
/// - `evaluation_text`: 评审模型原始输出
///
/// # 返回
/// 返回解析后的评测；输入为空或 XML 语法错误时返回 `None`
pub fn parse_evaluation(evaluation_text: &str) -> Option<ParsedEvaluation> {
    if evaluation_text.is_empty() {
        return None;
    }

    let doc = match Document::parse(evaluation_text) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("评审输出 XML 解析失败，返回 None: {}", e);
            return None;
        }
    };

    let mut dimensions = BTreeMap::new();
    let mut scores = Vec::new();

    for dim in doc.descendants().filter(|n| n.has_tag_name("Dimension")) {
        let Some(name) = dim.attribute("name").filter(|name| !name.is_empty()) else {
            continue;
        };
        let Some(score_el) = first_descendant(dim, "Score") else {
            continue;
        };
        let Some(score) = parse_float_prefix(text_content(score_el).trim()) else {
            debug!("维度 {} 的分数无法解析，跳过", name);
            continue;
        };

        let reason = first_descendant(dim, "Reason")
            .map(|el| text_content(el).trim().to_string())
            .unwrap_or_default();

        dimensions.insert(
            name.to_string(),
            DimensionScore {
                score: Some(score),
                reason,
            },
        );
        scores.push(score);
    }

    let explicit_overall = first_descendant(doc.root(), "OverallScore")
        .and_then(|el| parse_float_prefix(text_content(el).trim()));

    let overall = explicit_overall.or_else(|| mean(&scores));

    let critique = first_descendant(doc.root(), "Critique")
        .map(|el| text_content(el).trim().to_string())
        .unwrap_or_default();

    debug!(
        "评审输出解析完成: {} 个维度, 总分 {:?}",
        dimensions.len(),
        overall
    );

    Some(ParsedEvaluation {
        dimensions,
        overall,
        critique,
    })
}

/// 旧版评审接口的分数提取：取第一个 `<Score>...</Score>` 的内容
pub fn extract_score(text: &str) -> Option<String> {
    LEGACY_SCORE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn first_descendant<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|n| n.is_element() && n.has_tag_name(tag))
}

/// 元素内所有文本节点拼接后的内容
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
