//! 导出上下文
//!
//! 封装"我正在导出哪一条评测"这一信息

use std::fmt::Display;

use crate::models::RawCase;

/// 导出上下文
#[derive(Debug, Clone)]
pub struct ExportCtx {
    /// 评测 ID（缺失时为 "0"）
    pub eval_id: String,

    /// 生成模型（仅用于日志显示）
    pub generator: String,
}

impl ExportCtx {
    pub fn new(eval_id: impl Into<String>, generator: impl Into<String>) -> Self {
        Self {
            eval_id: eval_id.into(),
            generator: generator.into(),
        }
    }

    pub fn from_case(case: &RawCase) -> Self {
        Self::new(case.eval_id_string(), case.generator.clone())
    }
}

impl Display for ExportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[评测 #{}]", self.eval_id)
    }
}
