//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"和"截图"的能力

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::dom::Rgba;
use chromiumoxide::cdp::browser_protocol::emulation::SetDefaultBackgroundColorOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源
/// - 暴露 eval() 和 screenshot() 能力
/// - 不认识评测案例 / 预览区域
/// - 不处理业务流程
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// # 参数
    /// - `js_code`: 要执行的 JavaScript 代码
    ///
    /// # 返回
    /// 返回 JSON 值
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 截取页面指定区域，返回 PNG 字节
    ///
    /// # 参数
    /// - `x`, `y`, `width`, `height`: 文档坐标（CSS 像素）
    /// - `scale`: 设备像素倍率
    pub async fn screenshot_clip(
        &self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(Viewport {
                x,
                y,
                width,
                height,
                scale,
            })
            .capture_beyond_viewport(true)
            .build();
        let bytes = self.page.screenshot(params).await?;
        Ok(bytes)
    }

    /// 把页面默认背景设为不透明白色（透明区域截图后为白底）
    pub async fn force_white_background(&self) -> Result<()> {
        self.page
            .execute(SetDefaultBackgroundColorOverrideParams {
                color: Some(Rgba {
                    r: 255,
                    g: 255,
                    b: 255,
                    a: Some(1.0),
                }),
            })
            .await?;
        Ok(())
    }

    /// 取消背景覆盖，恢复页面自身的背景
    pub async fn clear_background_override(&self) -> Result<()> {
        self.page
            .execute(SetDefaultBackgroundColorOverrideParams { color: None })
            .await?;
        Ok(())
    }
}
