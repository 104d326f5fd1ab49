//! 预览区域
//!
//! 截图层只通过 `PreviewSurface` 访问页面上的预览元素。
//! 预览元素本身可能是 iframe，也可能内部嵌有 iframe（沙箱中运行生成的 vtk.js 代码），
//! 子文档可能跨域而无法访问。

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::capture::canvas::decode_data_url;
use crate::error::CaptureError;
use crate::infrastructure::JsExecutor;

/// 文档坐标系下的矩形（CSS 像素）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct SurfaceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 预览元素的布局
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceLayout {
    /// 元素本身是否是子文档宿主（iframe）
    pub is_frame_host: bool,
    /// 元素的边界框
    pub bounds: SurfaceRect,
    /// 左、上边框宽度
    #[serde(default)]
    pub client_left: f64,
    #[serde(default)]
    pub client_top: f64,
    pub client_width: f64,
    pub client_height: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
}

impl SurfaceLayout {
    /// 宿主可见区域（边框内侧）
    pub fn visible_clip(&self) -> SurfaceRect {
        SurfaceRect {
            x: self.bounds.x + self.client_left,
            y: self.bounds.y + self.client_top,
            width: self.client_width,
            height: self.client_height,
        }
    }

    /// 元素完整的滚动区域
    pub fn scroll_clip(&self) -> SurfaceRect {
        SurfaceRect {
            x: self.bounds.x,
            y: self.bounds.y,
            width: self.scroll_width,
            height: self.scroll_height,
        }
    }
}

/// 子文档探测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameProbe {
    /// 没有嵌套的子文档
    NoFrame,
    /// 子文档存在，画布尚未绘制
    Pending,
    /// 画布已有渲染高度
    Rendered,
    /// 子文档无法访问（跨域等）
    Inaccessible,
}

/// 光栅化请求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRequest {
    pub clip: SurfaceRect,
    pub scale: f64,
}

/// 页面上的一个预览区域
pub trait PreviewSurface: Send + Sync {
    /// 日志中使用的名称
    fn label(&self) -> &str;

    /// 读取布局，元素不存在时返回错误
    fn layout(&self) -> BoxFuture<'_, Result<SurfaceLayout>>;

    /// 查找嵌套的子文档并检查其中的绘制画布
    fn probe_frame(&self) -> BoxFuture<'_, Result<FrameProbe>>;

    /// 宿主 iframe 的内部文档是否可访问（同源且已加载）
    fn frame_document_accessible(&self) -> BoxFuture<'_, Result<bool>>;

    /// 白底光栅化指定区域，返回 PNG 字节
    fn rasterize(&self, request: RasterRequest) -> BoxFuture<'_, Result<Vec<u8>>>;

    /// 读取子文档中绘制画布的像素（PNG 字节），找不到画布时返回 `None`
    fn read_frame_canvas(&self) -> BoxFuture<'_, Result<Option<Vec<u8>>>>;
}

/// 基于 Chromium 页面的预览区域，用 CSS 选择器定位
pub struct ChromePreview {
    executor: JsExecutor,
    selector: String,
    label: String,
}

#[derive(Deserialize)]
struct LayoutReply {
    found: bool,
    layout: Option<SurfaceLayout>,
}

#[derive(Deserialize)]
struct ProbeReply {
    state: FrameProbe,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasReply {
    data_url: Option<String>,
}

impl ChromePreview {
    pub fn new(executor: JsExecutor, selector: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            executor,
            selector: selector.into(),
            label: label.into(),
        }
    }

    /// 页面上是否存在该预览元素
    pub async fn exists(&self) -> Result<bool> {
        let script = format!(
            "(() => document.querySelector({}) !== null)()",
            self.selector_literal()?
        );
        self.executor.eval_as(script).await
    }

    fn selector_literal(&self) -> Result<String> {
        serde_json::to_string(&self.selector).context("无法序列化选择器")
    }

    async fn read_layout(&self) -> Result<SurfaceLayout> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return {{ found: false, layout: null }};
                const r = el.getBoundingClientRect();
                return {{
                    found: true,
                    layout: {{
                        isFrameHost: el.tagName === 'IFRAME',
                        bounds: {{ x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height }},
                        clientLeft: el.clientLeft,
                        clientTop: el.clientTop,
                        clientWidth: el.clientWidth,
                        clientHeight: el.clientHeight,
                        scrollWidth: el.scrollWidth,
                        scrollHeight: el.scrollHeight
                    }}
                }};
            }})()
            "#,
            sel = self.selector_literal()?
        );

        let reply: LayoutReply = self.executor.eval_as(script).await?;
        match (reply.found, reply.layout) {
            (true, Some(layout)) => {
                debug!("[{}] 布局: {:?}", self.label, layout);
                Ok(layout)
            }
            _ => Err(CaptureError::ElementNotFound {
                selector: self.selector.clone(),
            }
            .into()),
        }
    }

    async fn read_probe(&self) -> Result<FrameProbe> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return {{ state: 'noFrame' }};
                const frame = el.tagName === 'IFRAME' ? el : el.querySelector('iframe');
                if (!frame) return {{ state: 'noFrame' }};
                try {{
                    const doc = frame.contentDocument || frame.contentWindow.document;
                    if (!doc) return {{ state: 'inaccessible' }};
                    const canvas = doc.querySelector('canvas');
                    if (canvas && canvas.getBoundingClientRect().height > 0) return {{ state: 'rendered' }};
                    return {{ state: 'pending' }};
                }} catch (e) {{
                    return {{ state: 'inaccessible' }};
                }}
            }})()
            "#,
            sel = self.selector_literal()?
        );

        let reply: ProbeReply = self.executor.eval_as(script).await?;
        Ok(reply.state)
    }

    async fn read_frame_accessible(&self) -> Result<bool> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el || el.tagName !== 'IFRAME') return false;
                try {{
                    const doc = el.contentDocument;
                    return !!(doc && doc.body && doc.readyState !== 'loading');
                }} catch (e) {{
                    return false;
                }}
            }})()
            "#,
            sel = self.selector_literal()?
        );

        self.executor.eval_as(script).await
    }

    async fn capture_region(&self, request: RasterRequest) -> Result<Vec<u8>> {
        if request.clip.width <= 0.0 || request.clip.height <= 0.0 {
            return Err(CaptureError::RasterizeFailed {
                label: self.label.clone(),
                reason: format!("区域为空: {:?}", request.clip),
            }
            .into());
        }

        self.executor.force_white_background().await?;
        let clip = request.clip;
        let shot = self
            .executor
            .screenshot_clip(clip.x, clip.y, clip.width, clip.height, request.scale)
            .await;
        if let Err(e) = self.executor.clear_background_override().await {
            warn!("[{}] 恢复页面背景失败: {}", self.label, e);
        }
        shot.with_context(|| format!("[{}] 截图失败", self.label))
    }

    async fn read_canvas(&self) -> Result<Option<Vec<u8>>> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return {{ dataUrl: null }};
                const frame = el.tagName === 'IFRAME' ? el : el.querySelector('iframe');
                try {{
                    const doc = frame ? (frame.contentDocument || frame.contentWindow.document) : document;
                    const scope = frame ? doc : el;
                    const canvas = scope.querySelector('canvas');
                    if (!canvas) return {{ dataUrl: null }};
                    return {{ dataUrl: canvas.toDataURL('image/png') }};
                }} catch (e) {{
                    return {{ dataUrl: null }};
                }}
            }})()
            "#,
            sel = self.selector_literal()?
        );

        let reply: CanvasReply = self.executor.eval_as(script).await?;
        match reply.data_url {
            Some(url) => Ok(Some(decode_data_url(&url)?)),
            None => Ok(None),
        }
    }
}

impl PreviewSurface for ChromePreview {
    fn label(&self) -> &str {
        &self.label
    }

    fn layout(&self) -> BoxFuture<'_, Result<SurfaceLayout>> {
        Box::pin(self.read_layout())
    }

    fn probe_frame(&self) -> BoxFuture<'_, Result<FrameProbe>> {
        Box::pin(self.read_probe())
    }

    fn frame_document_accessible(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(self.read_frame_accessible())
    }

    fn rasterize(&self, request: RasterRequest) -> BoxFuture<'_, Result<Vec<u8>>> {
        Box::pin(self.capture_region(request))
    }

    fn read_frame_canvas(&self) -> BoxFuture<'_, Result<Option<Vec<u8>>>> {
        Box::pin(self.read_canvas())
    }
}
