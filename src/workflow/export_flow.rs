//! 导出流程 - 流程层
//!
//! 核心职责：定义"一次导出"的完整流程
//!
//! 流程顺序：
//! 1. 校验两个预览区域都存在
//! 2. 整体等待，然后依次等待渲染并截取生成预览、Ground truth 预览
//! 3. 合并评分
//! 4. 组装导出数据并提交，检查确认

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::capture::{CaptureSource, Clock, PreviewSurface, RenderWaiter, TokioClock, VisualCapture, WaiterConfig};
use crate::config::Config;
use crate::error::{AppError, AppResult, ExportError};
use crate::models::{ExportPayload, PreviewImages, RawCase, SubmitAck};
use crate::scoring::{aggregate, resolve_parsed};
use crate::services::Submitter;
use crate::utils::logging::{log_export_start, log_export_summary};
use crate::workflow::export_ctx::ExportCtx;

/// 单个预览的截图结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOutcome {
    pub source: CaptureSource,
    /// 图片是否放入了导出数据（占位图可能按配置替换为 null）
    pub embedded: bool,
}

/// 一次成功导出的摘要
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub eval_id: String,
    pub overall_score: f64,
    pub generated: PreviewOutcome,
    pub truth: PreviewOutcome,
    pub ack: SubmitAck,
}

/// 导出流程
///
/// - 编排截图、评分和提交
/// - 截图失败只影响对应的那张图
/// - 不持有浏览器资源，只依赖预览区域和提交服务
pub struct ExportFlow<C: Clock = TokioClock> {
    waiter: RenderWaiter<C>,
    capture: VisualCapture,
    submitter: Arc<dyn Submitter>,
    export_settle: Duration,
    embed_placeholder: bool,
    verbose_logging: bool,
}

impl ExportFlow<TokioClock> {
    pub fn new(config: &Config, submitter: Arc<dyn Submitter>) -> Self {
        Self::with_clock(config, TokioClock, submitter)
    }
}

impl<C: Clock> ExportFlow<C> {
    pub fn with_clock(config: &Config, clock: C, submitter: Arc<dyn Submitter>) -> Self {
        Self {
            waiter: RenderWaiter::new(clock, WaiterConfig::from(config)),
            capture: VisualCapture::default(),
            submitter,
            export_settle: config.export_settle(),
            embed_placeholder: config.embed_placeholder_on_failure,
            verbose_logging: config.verbose_logging,
        }
    }

    /// 替换截图器（自定义策略顺序）
    pub fn with_capture(mut self, capture: VisualCapture) -> Self {
        self.capture = capture;
        self
    }

    pub async fn run(
        &self,
        case: &RawCase,
        generated: Option<&dyn PreviewSurface>,
        truth: Option<&dyn PreviewSurface>,
    ) -> AppResult<ExportReport> {
        let ctx = ExportCtx::from_case(case);

        // ========== 1. 校验预览区域 ==========
        let (generated, truth) = match (generated, truth) {
            (Some(g), Some(t)) => (g, t),
            (None, Some(_)) => return Err(self.fail_fast(&ctx, "generated")),
            (Some(_), None) => return Err(self.fail_fast(&ctx, "truth")),
            (None, None) => return Err(self.fail_fast(&ctx, "generated, truth")),
        };

        log_export_start(&ctx, case, self.verbose_logging);

        // ========== 2. 截图 ==========
        self.waiter.clock().sleep(self.export_settle).await;

        let (generated_image, generated_outcome) = self.capture_preview(&ctx, generated).await;
        let (truth_image, truth_outcome) = self.capture_preview(&ctx, truth).await;

        // ========== 3. 评分 ==========
        let parsed = resolve_parsed(case);
        let evaluation = aggregate(case, parsed.as_ref());
        let overall_score = evaluation.overall_score;
        info!("{} 综合评分: {}", ctx, overall_score);

        // ========== 4. 组装并提交 ==========
        let now = Utc::now();
        let payload = ExportPayload::assemble(
            case,
            evaluation,
            PreviewImages {
                generated: generated_image,
                truth: truth_image,
            },
            now,
            now,
        );

        info!("{} 📤 提交导出数据...", ctx);
        let ack = match self.submitter.submit(&payload).await {
            Ok(ack) => ack,
            Err(e) => {
                error!("{} ❌ 提交失败: {:#}", ctx, e);
                return Err(AppError::submission_failed(e));
            }
        };

        if !ack.success {
            let message = ack.message();
            error!("{} ❌ 导出接口未确认: {}", ctx, message);
            return Err(ExportError::Rejected { message }.into());
        }

        let report = ExportReport {
            eval_id: ctx.eval_id.clone(),
            overall_score,
            generated: generated_outcome,
            truth: truth_outcome,
            ack,
        };
        log_export_summary(&ctx, &report);
        Ok(report)
    }

    fn fail_fast(&self, ctx: &ExportCtx, which: &'static str) -> AppError {
        error!("{} ❌ 预览区域不存在: {}", ctx, which);
        AppError::missing_preview(which)
    }

    /// 等待渲染并截图；占位图按配置决定是否放入导出数据
    async fn capture_preview(
        &self,
        ctx: &ExportCtx,
        surface: &dyn PreviewSurface,
    ) -> (Option<String>, PreviewOutcome) {
        info!("{} 📸 截取 {} ...", ctx, surface.label());
        self.waiter.wait(surface).await;
        let image = self.capture.capture(surface).await;

        let embedded = !image.is_placeholder() || self.embed_placeholder;
        if image.is_placeholder() {
            warn!(
                "{} ⚠️ {} 截图失败，{}",
                ctx,
                surface.label(),
                if embedded { "使用占位图" } else { "图片为 null" }
            );
        }

        let outcome = PreviewOutcome {
            source: image.source,
            embedded,
        };
        let data_url = if embedded { Some(image.data_url) } else { None };
        (data_url, outcome)
    }
}
