//! 分数换算
//!
//! 0–1 分制与 0–100 分制之间的转换，以及等级和颜色的划分

use crate::models::evaluation::{DimensionScore, ParsedEvaluation};
use crate::models::score::ScoreValue;

/// 分数等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLevel {
    Excellent,
    Good,
    Pass,
    Fail,
    Unknown,
}

impl ScoreLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreLevel::Excellent => "Excellent",
            ScoreLevel::Good => "Good",
            ScoreLevel::Pass => "Pass",
            ScoreLevel::Fail => "Fail",
            ScoreLevel::Unknown => "Unknown",
        }
    }
}

/// 分数颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreColor {
    /// ≥ 80
    High,
    /// ≥ 60
    Medium,
    /// < 60
    Low,
    /// 未评分（0）或无效
    Neutral,
}

impl ScoreColor {
    pub fn hex(self) -> &'static str {
        match self {
            ScoreColor::High => "#455a64",
            ScoreColor::Medium => "#546e7a",
            ScoreColor::Low => "#607d8b",
            ScoreColor::Neutral => "#9e9e9e",
        }
    }
}

/// 将 0–1 分数转换为百分制，保留 `decimals` 位小数
///
/// `None`、空串或无法解析的字符串返回 `None`
pub fn to_hundred(score: Option<&ScoreValue>, decimals: u32) -> Option<f64> {
    let value = score?.to_f64()?;
    Some(round_to(value * 100.0, decimals))
}

/// `to_hundred` 的浮点版本
pub fn to_hundred_f64(score: Option<f64>, decimals: u32) -> Option<f64> {
    score
        .filter(|v| v.is_finite())
        .map(|v| round_to(v * 100.0, decimals))
}

/// 划分分数等级
///
/// 非百分制且 ≤ 1 的分数先乘以 100
pub fn classify_level(score: Option<&ScoreValue>, is_hundred_scale: bool) -> ScoreLevel {
    let Some(value) = score.and_then(ScoreValue::to_f64) else {
        return ScoreLevel::Unknown;
    };
    let value = normalize(value, is_hundred_scale);

    if value >= 90.0 {
        ScoreLevel::Excellent
    } else if value >= 80.0 {
        ScoreLevel::Good
    } else if value >= 60.0 {
        ScoreLevel::Pass
    } else {
        ScoreLevel::Fail
    }
}

/// 分数颜色
///
/// 恰好为 0 的分数视为"未评分"，返回中性色而不是低分色
pub fn color_for(score: Option<&ScoreValue>, is_hundred_scale: bool) -> ScoreColor {
    let value = match score.and_then(ScoreValue::to_f64) {
        Some(v) if v != 0.0 => normalize(v, is_hundred_scale),
        _ => return ScoreColor::Neutral,
    };

    if value >= 80.0 {
        ScoreColor::High
    } else if value >= 60.0 {
        ScoreColor::Medium
    } else {
        ScoreColor::Low
    }
}

/// 格式化显示分数，无效分数显示 "--"
pub fn format_score(score: Option<&ScoreValue>, show_unit: bool) -> String {
    match to_hundred(score, 1) {
        None => "--".to_string(),
        Some(v) if show_unit => format!("{}分", v),
        Some(v) => v.to_string(),
    }
}

impl ParsedEvaluation {
    /// 转换为百分制副本，无效分数保持 `None`
    pub fn to_hundred_scale(&self) -> ParsedEvaluation {
        ParsedEvaluation {
            overall: to_hundred_f64(self.overall, 1),
            critique: self.critique.clone(),
            dimensions: self
                .dimensions
                .iter()
                .map(|(name, dim)| {
                    (
                        name.clone(),
                        DimensionScore {
                            score: to_hundred_f64(dim.score, 1),
                            reason: dim.reason.clone(),
                        },
                    )
                })
                .collect(),
        }
    }
}

fn normalize(value: f64, is_hundred_scale: bool) -> f64 {
    if !is_hundred_scale && value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
