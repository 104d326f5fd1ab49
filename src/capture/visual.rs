//! 预览截图
//!
//! 按顺序尝试各截图策略，全部失败时返回占位图。`capture` 从不返回错误。

use std::fmt;

use tracing::{debug, info, warn};

use crate::capture::canvas::to_data_url;
use crate::capture::placeholder::{placeholder_data_url, PlaceholderReason};
use crate::capture::strategy::{default_strategies, CaptureStrategy, StrategyOutcome};
use crate::capture::surface::PreviewSurface;

/// 占位图本身编码失败时使用的 1×1 PNG
const FALLBACK_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==";

/// 截图来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// 由某个策略截得
    Strategy(&'static str),
    /// 占位图
    Placeholder(PlaceholderReason),
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Strategy(name) => write!(f, "{}", name),
            CaptureSource::Placeholder(reason) => write!(f, "placeholder ({})", reason.caption()),
        }
    }
}

/// 一张截图（PNG data URL）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub data_url: String,
    pub source: CaptureSource,
}

impl CapturedImage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, CaptureSource::Placeholder(_))
    }

    fn placeholder(reason: PlaceholderReason) -> Self {
        let data_url = placeholder_data_url(reason).unwrap_or_else(|e| {
            warn!("⚠️ 占位图编码失败: {}", e);
            FALLBACK_DATA_URL.to_string()
        });
        Self {
            data_url,
            source: CaptureSource::Placeholder(reason),
        }
    }
}

/// 预览截图器
pub struct VisualCapture {
    strategies: Vec<Box<dyn CaptureStrategy>>,
}

impl Default for VisualCapture {
    fn default() -> Self {
        Self::new(default_strategies())
    }
}

impl VisualCapture {
    pub fn new(strategies: Vec<Box<dyn CaptureStrategy>>) -> Self {
        Self { strategies }
    }

    /// 截取预览区域
    pub async fn capture(&self, surface: &dyn PreviewSurface) -> CapturedImage {
        let label = surface.label().to_string();

        let layout = match surface.layout().await {
            Ok(layout) => layout,
            Err(e) => {
                warn!("[{}] ⚠️ 无法定位预览区域: {}", label, e);
                return CapturedImage::placeholder(PlaceholderReason::PreviewUnavailable);
            }
        };

        for strategy in &self.strategies {
            match strategy.attempt(surface, &layout).await {
                Ok(StrategyOutcome::Captured(png)) => {
                    info!("[{}] ✓ 截图成功 ({})", label, strategy.name());
                    return CapturedImage {
                        data_url: to_data_url(&png),
                        source: CaptureSource::Strategy(strategy.name()),
                    };
                }
                Ok(StrategyOutcome::Skipped) => {
                    debug!("[{}] 跳过策略 {}", label, strategy.name());
                }
                Err(e) => {
                    warn!("[{}] 策略 {} 失败: {}", label, strategy.name(), e);
                }
            }
        }

        warn!("[{}] ❌ 所有截图方式均失败，使用占位图", label);
        CapturedImage::placeholder(PlaceholderReason::CaptureFailed)
    }
}
