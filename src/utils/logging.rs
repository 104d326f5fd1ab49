/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::{debug, info};

use crate::config::Config;
use crate::models::RawCase;
use crate::workflow::{ExportCtx, ExportReport};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 评测结果导出");
    info!("🌐 评测页面: {}", config.target_url);
    info!("📮 导出接口: {}", config.export_endpoint);
    info!("{}", "=".repeat(60));
}

/// 记录导出开始信息
///
/// # 参数
/// - `ctx`: 导出上下文
/// - `case`: 评测案例
/// - `verbose`: 是否显示提示词预览
pub fn log_export_start(ctx: &ExportCtx, case: &RawCase, verbose: bool) {
    info!("\n{}", "─".repeat(60));
    info!("{} 开始导出 (生成模型: {})", ctx, display_or_dash(&ctx.generator));
    if verbose {
        info!("{} 提示词: {}", ctx, truncate_text(&case.prompt, 80));
    } else {
        debug!("{} 提示词: {}", ctx, truncate_text(&case.prompt, 80));
    }
}

/// 记录导出完成信息
pub fn log_export_summary(ctx: &ExportCtx, report: &ExportReport) {
    info!("{}", "─".repeat(60));
    info!("{} ✅ 导出成功", ctx);
    info!("📊 综合评分: {}", report.overall_score);
    info!(
        "🖼️ 生成预览: {}{}",
        report.generated.source,
        if report.generated.embedded { "" } else { " (null)" }
    );
    info!(
        "🖼️ Ground truth 预览: {}{}",
        report.truth.source,
        if report.truth.embedded { "" } else { " (null)" }
    );
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

fn display_or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("渲染一个圆锥体", 4), "渲染一个...");
        assert_eq!(truncate_text("cone", 10), "cone");
    }
}
