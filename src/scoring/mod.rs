//! 评分层
//!
//! - `scale` - 0–1 / 0–100 分制换算、等级与颜色
//! - `parser` - 评审模型 XML 输出解析
//! - `aggregator` - 自动检查 / LLM / 人工评测合并

pub mod aggregator;
pub mod parser;
pub mod scale;

pub use aggregator::{aggregate, resolve_parsed, to_snake_case};
pub use parser::{extract_score, parse_evaluation};
pub use scale::{classify_level, color_for, format_score, to_hundred, ScoreColor, ScoreLevel};
