//! 流程层（Workflow Layer）
//!
//! 定义"一次导出"的完整流程：等待渲染 → 截图 ×2 → 评分 → 提交

pub mod export_ctx;
pub mod export_flow;

pub use export_ctx::ExportCtx;
pub use export_flow::{ExportFlow, ExportReport, PreviewOutcome};
