use sivpilot_export::browser::connect_to_browser_and_page;
use sivpilot_export::capture::{ChromePreview, PreviewSurface, RenderWaiter, TokioClock, VisualCapture, WaiterConfig};
use sivpilot_export::capture::canvas::is_png_data_url;
use sivpilot_export::config::Config;
use sivpilot_export::logger;
use sivpilot_export::JsExecutor;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    logger::init(true);
    let config = Config::from_env();

    let result = connect_to_browser_and_page(config.browser_debug_port, &config.target_url).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_capture_generated_preview() {
    logger::init(true);
    let config = Config::from_env();

    // 需要已打开的评测页面，且生成预览已渲染
    let (_browser, page) = connect_to_browser_and_page(config.browser_debug_port, &config.target_url)
        .await
        .expect("连接浏览器失败");
    let executor = JsExecutor::new(page);
    let preview = ChromePreview::new(executor, &config.generated_preview_selector, "generated");

    assert!(preview.exists().await.expect("查找预览失败"), "页面上应有生成预览");

    let waiter = RenderWaiter::new(TokioClock, WaiterConfig::from(&config));
    waiter.wait(&preview).await;

    let image = VisualCapture::default().capture(&preview as &dyn PreviewSurface).await;
    println!("截图来源: {}", image.source);
    assert!(is_png_data_url(&image.data_url));
}

#[tokio::test]
#[ignore]
async fn test_background_override_is_cleared() {
    logger::init(true);
    let config = Config::from_env();

    let (_browser, page) = connect_to_browser_and_page(config.browser_debug_port, &config.target_url)
        .await
        .expect("连接浏览器失败");
    let executor = JsExecutor::new(page);

    executor.force_white_background().await.expect("设置背景失败");
    executor.clear_background_override().await.expect("恢复背景失败");
}
