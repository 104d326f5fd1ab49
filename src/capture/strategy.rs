//! 截图策略
//!
//! 按顺序尝试：子文档光栅化 → 元素光栅化 → 子文档画布拷贝。
//! 子文档不可访问时，宿主 iframe 仍按元素区域截图（合成后的像素包含跨域内容），
//! 白底画布拷贝是最后一种真实截图方式。
//! 策略只判断自己是否适用并产出 PNG 字节，回退和占位由 `VisualCapture` 负责。

use anyhow::Result;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::capture::canvas::{Canvas, WHITE};
use crate::capture::surface::{PreviewSurface, RasterRequest, SurfaceLayout};
use crate::error::CaptureError;

/// 策略的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// 得到 PNG 字节
    Captured(Vec<u8>),
    /// 策略不适用于这个预览区域
    Skipped,
}

/// 一种截图方式
pub trait CaptureStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt<'a>(
        &'a self,
        surface: &'a dyn PreviewSurface,
        layout: &'a SurfaceLayout,
    ) -> BoxFuture<'a, Result<StrategyOutcome>>;
}

/// 默认策略顺序
pub fn default_strategies() -> Vec<Box<dyn CaptureStrategy>> {
    vec![
        Box::new(FrameDocumentStrategy),
        Box::new(ElementStrategy),
        Box::new(FrameCanvasStrategy),
    ]
}

/// 宿主 iframe 的内部文档可访问时，按宿主可见尺寸白底光栅化
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDocumentStrategy;

impl CaptureStrategy for FrameDocumentStrategy {
    fn name(&self) -> &'static str {
        "frame-document"
    }

    fn attempt<'a>(
        &'a self,
        surface: &'a dyn PreviewSurface,
        layout: &'a SurfaceLayout,
    ) -> BoxFuture<'a, Result<StrategyOutcome>> {
        Box::pin(async move {
            if !layout.is_frame_host {
                return Ok(StrategyOutcome::Skipped);
            }
            if !surface.frame_document_accessible().await? {
                return Err(CaptureError::FrameInaccessible {
                    label: surface.label().to_string(),
                }
                .into());
            }

            let png = surface
                .rasterize(RasterRequest {
                    clip: layout.visible_clip(),
                    scale: 1.0,
                })
                .await?;
            Ok(StrategyOutcome::Captured(png))
        })
    }
}

/// 新建与宿主同尺寸的白色画布，尽量把子文档中的绘制画布拷贝进来
///
/// 拷贝失败时保留白色画布，这个策略本身不会因为子文档问题失败。
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCanvasStrategy;

impl CaptureStrategy for FrameCanvasStrategy {
    fn name(&self) -> &'static str {
        "frame-canvas"
    }

    fn attempt<'a>(
        &'a self,
        surface: &'a dyn PreviewSurface,
        layout: &'a SurfaceLayout,
    ) -> BoxFuture<'a, Result<StrategyOutcome>> {
        Box::pin(async move {
            if !layout.is_frame_host {
                return Ok(StrategyOutcome::Skipped);
            }

            let width = layout.bounds.width.round().max(1.0) as u32;
            let height = layout.bounds.height.round().max(1.0) as u32;
            let mut canvas = Canvas::filled(width, height, WHITE);

            match surface.read_frame_canvas().await {
                Ok(Some(png)) => match Canvas::decode_png(&png) {
                    Ok(image) => canvas.draw_image(&image, 0, 0),
                    Err(e) => warn!("[{}] 画布像素无法解码，保留白底: {}", surface.label(), e),
                },
                Ok(None) => debug!("[{}] 子文档中没有画布，保留白底", surface.label()),
                Err(e) => warn!("[{}] 读取子文档画布失败，保留白底: {}", surface.label(), e),
            }

            Ok(StrategyOutcome::Captured(canvas.encode_png()?))
        })
    }
}

/// 以 2 倍像素密度直接光栅化元素
///
/// 普通元素截取完整的滚动区域；宿主 iframe 截取其可见区域。
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementStrategy;

impl CaptureStrategy for ElementStrategy {
    fn name(&self) -> &'static str {
        "element"
    }

    fn attempt<'a>(
        &'a self,
        surface: &'a dyn PreviewSurface,
        layout: &'a SurfaceLayout,
    ) -> BoxFuture<'a, Result<StrategyOutcome>> {
        Box::pin(async move {
            let clip = if layout.is_frame_host {
                layout.visible_clip()
            } else {
                layout.scroll_clip()
            };

            let png = surface
                .rasterize(RasterRequest { clip, scale: 2.0 })
                .await?;
            Ok(StrategyOutcome::Captured(png))
        })
    }
}
