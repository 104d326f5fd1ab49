//! 应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：连接或启动浏览器、创建 JsExecutor、提交服务和案例存储
//! 2. **案例来源**：命令行给出的案例文件，否则读取本地保存的当前案例
//! 3. **预览定位**：在评测页面上查找两个预览区域
//! 4. **向下委托**：交给 `ExportFlow` 完成一次导出

use std::path::Path;
use std::sync::Arc;

use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::capture::{ChromePreview, PreviewSurface};
use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError, FileError};
use crate::infrastructure::JsExecutor;
use crate::models::{load_case_file, RawCase};
use crate::services::{ConfigSnapshot, FileCaseStore, HttpSubmitter};
use crate::utils::logging::log_startup;
use crate::workflow::{ExportFlow, ExportReport};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
    store: FileCaseStore,
    flow: ExportFlow,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let (browser, page) = if config.headless {
            browser::launch_headless_browser(&config.target_url, config.chrome_executable.as_deref())
                .await
                .map_err(|e| BrowserError::LaunchFailed { source: e.into() })?
        } else {
            browser::connect_to_browser_and_page(config.browser_debug_port, &config.target_url)
                .await
                .map_err(|e| BrowserError::ConnectionFailed {
                    port: config.browser_debug_port,
                    source: e.into(),
                })?
        };

        // 创建 JsExecutor（持有 page）
        let executor = JsExecutor::new(page);
        let store = FileCaseStore::new(&config.store_dir, config.storage_keys.clone());
        let flow = ExportFlow::new(&config, Arc::new(HttpSubmitter::from_config(&config)));

        Ok(Self {
            config,
            _browser: browser,
            executor,
            store,
            flow,
        })
    }

    /// 导出一条评测：给出案例文件时使用文件，否则使用本地保存的当前案例
    pub async fn run(&self, case_path: Option<&Path>) -> AppResult<ExportReport> {
        let case = self.load_case(case_path).await?;

        let generated = self
            .locate(&self.config.generated_preview_selector, "generated")
            .await;
        let truth = self.locate(&self.config.truth_preview_selector, "truth").await;

        let report = self
            .flow
            .run(
                &case,
                generated.as_ref().map(|p| p as &dyn PreviewSurface),
                truth.as_ref().map(|p| p as &dyn PreviewSurface),
            )
            .await?;

        if case_path.is_some() {
            self.store.save_config(&ConfigSnapshot::from_case(&case));
            if self.store.save_current_case(&case) {
                info!("💾 已保存为当前案例: {}", self.store.dir().display());
            }
        }

        Ok(report)
    }

    async fn load_case(&self, case_path: Option<&Path>) -> AppResult<RawCase> {
        match case_path {
            Some(path) => {
                info!("📁 读取案例文件: {}", path.display());
                if !path.exists() {
                    return Err(FileError::NotFound {
                        path: path.display().to_string(),
                    }
                    .into());
                }
                let case = load_case_file(path).await.map_err(|e| FileError::ReadFailed {
                    path: path.display().to_string(),
                    source: e.into(),
                })?;
                Ok(case)
            }
            None => {
                if let Some(saved) = self.store.last_save_time() {
                    info!("📁 使用本地保存的当前案例 (保存于 {})", saved.to_rfc3339());
                }
                if let Some(snapshot) = self.store.load_config() {
                    info!(
                        "📋 保存的评测配置: 生成模型={} 评审模型={}",
                        snapshot.generator.as_deref().unwrap_or("-"),
                        snapshot.evaluator.as_deref().unwrap_or("-")
                    );
                }
                self.store.load_current_case().ok_or_else(|| {
                    AppError::Other(format!(
                        "没有可导出的案例: 请指定案例文件，或先在 {} 中保存当前案例",
                        self.store.dir().display()
                    ))
                })
            }
        }
    }

    /// 查找预览区域，找不到时返回 `None`
    async fn locate(&self, selector: &str, label: &str) -> Option<ChromePreview> {
        let preview = ChromePreview::new(self.executor.clone(), selector, label);
        match preview.exists().await {
            Ok(true) => Some(preview),
            Ok(false) => {
                warn!("⚠️ 页面上找不到 {} 预览: {}", label, selector);
                None
            }
            Err(e) => {
                warn!("⚠️ 查找 {} 预览失败: {:#}", label, e);
                None
            }
        }
    }
}
