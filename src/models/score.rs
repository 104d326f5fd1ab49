//! 分数值
//!
//! 前端保存的分数可能是数字，也可能是字符串（例如评审模型直接吐出的 "0.85"）

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 数字前缀，与浏览器 `parseFloat` 的接受范围一致
static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid numeric prefix regex")
});

/// 数字或数字字符串形式的分数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(f64),
    Text(String),
}

impl ScoreValue {
    /// 转换为浮点数
    ///
    /// 字符串按前缀解析（"0.8分" → 0.8），空串或非数字返回 `None`
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            ScoreValue::Number(n) if n.is_finite() => Some(*n),
            ScoreValue::Number(_) => None,
            ScoreValue::Text(s) => parse_float_prefix(s),
        }
    }

    /// 是否是"有值"的分数：非零数字或非空字符串
    pub fn is_present(&self) -> bool {
        match self {
            ScoreValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ScoreValue::Text(s) => !s.is_empty(),
        }
    }
}

impl From<f64> for ScoreValue {
    fn from(value: f64) -> Self {
        ScoreValue::Number(value)
    }
}

impl From<&str> for ScoreValue {
    fn from(value: &str) -> Self {
        ScoreValue::Text(value.to_string())
    }
}

/// 解析字符串开头的数字，忽略前导空白和尾随内容
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let matched = NUMERIC_PREFIX.find(trimmed)?;
    matched.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}
