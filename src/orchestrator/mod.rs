//! 编排层（Orchestration Layer）
//!
//! 持有浏览器资源，决定导出哪个案例，然后委托给流程层
//!
//! ```text
//! orchestrator::App (浏览器、案例来源)
//!     ↓
//! workflow::ExportFlow (一次导出)
//!     ↓
//! capture / scoring / services
//!     ↓
//! infrastructure (JsExecutor)
//! ```

pub mod app;

pub use app::App;
