//! # SIVPilot Export
//!
//! 把 vtk.js 代码生成评测的一条结果（评审模型评分、人工评分、两张预览截图）
//! 合并成统一的导出数据并提交到导出接口
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 和截图能力
//!
//! ### ② 能力层（Scoring / Capture / Services）
//! - `scoring/` - 分制换算、评审输出解析、评分合并（纯函数）
//! - `capture/` - 等待渲染、按策略截图、占位图
//! - `services/` - 提交导出数据、本地保存案例
//!
//! ### ③ 流程层（Workflow）
//! - `ExportCtx` - 上下文封装（评测 ID）
//! - `ExportFlow` - 流程编排（校验 → 截图 ×2 → 评分 → 提交）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 浏览器连接、案例来源、预览定位
//!
//! ## 模块结构

pub mod browser;
pub mod capture;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod scoring;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_headless_browser};
pub use capture::{PreviewSurface, VisualCapture};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{CanonicalEvaluation, ExportPayload, ParsedEvaluation, RawCase};
pub use orchestrator::App;
pub use workflow::{ExportCtx, ExportFlow, ExportReport};
