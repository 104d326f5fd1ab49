//! 业务能力层
//!
//! - `submitter`: 提交导出数据
//! - `case_store`: 本地保存配置与当前案例

pub mod case_store;
pub mod submitter;

pub use case_store::{ConfigSnapshot, FileCaseStore};
pub use submitter::{HttpSubmitter, Submitter};
