use crate::models::case::RawCase;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载评测案例
pub async fn load_case_file(case_file_path: &Path) -> Result<RawCase> {
    let content = fs::read_to_string(case_file_path)
        .await
        .with_context(|| format!("无法读取案例文件: {}", case_file_path.display()))?;

    let case: RawCase = serde_json::from_str(&content)
        .with_context(|| format!("无法解析案例文件: {}", case_file_path.display()))?;

    tracing::info!(
        "成功加载案例 #{} ({})",
        case.eval_id_string(),
        case_file_path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(case)
}
