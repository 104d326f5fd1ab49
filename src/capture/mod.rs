//! 截图层
//!
//! - `surface`: 预览区域抽象与 Chromium 实现
//! - `waiter`: 等待子文档渲染
//! - `strategy` / `visual`: 截图策略与回退
//! - `canvas` / `placeholder`: 像素、PNG 编解码、占位图

pub mod canvas;
pub mod placeholder;
pub mod strategy;
pub mod surface;
pub mod visual;
pub mod waiter;

pub use placeholder::PlaceholderReason;
pub use strategy::{CaptureStrategy, StrategyOutcome};
pub use surface::{ChromePreview, FrameProbe, PreviewSurface, RasterRequest, SurfaceLayout, SurfaceRect};
pub use visual::{CaptureSource, CapturedImage, VisualCapture};
pub use waiter::{Clock, RenderWaiter, RetryPolicy, TokioClock, WaitOutcome, WaiterConfig};
