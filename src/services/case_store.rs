//! 案例存储服务 - 业务能力层
//!
//! 把配置快照和当前案例保存到本地目录，每个存储键对应一个文件。
//! 所有操作失败时只记录日志并返回 `false` / `None`。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, error};

use crate::config::StorageKeys;
use crate::models::payload::iso_timestamp;
use crate::models::RawCase;

/// 评测配置快照（提示词、模型选择、工作流等）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub ground_truth: Option<String>,
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default)]
    pub evaluator: Option<String>,
    #[serde(default)]
    pub workflow: Option<JsonValue>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// 保存时间，保存时自动填写
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ConfigSnapshot {
    /// 取案例中的评测配置部分
    pub fn from_case(case: &RawCase) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            prompt: non_empty(&case.prompt),
            ground_truth: non_empty(&case.ground_truth),
            generator: non_empty(&case.generator),
            evaluator: non_empty(&case.evaluator),
            workflow: case.workflow.clone(),
            name: None,
            path: None,
            timestamp: None,
        }
    }
}

/// 基于文件的案例存储
///
/// 职责：
/// - 按注入的 `StorageKeys` 读写快照
/// - 保存时记录时间戳
/// - 不关心导出流程
pub struct FileCaseStore {
    dir: PathBuf,
    keys: StorageKeys,
}

impl FileCaseStore {
    pub fn new(dir: impl Into<PathBuf>, keys: StorageKeys) -> Self {
        Self {
            dir: dir.into(),
            keys,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 保存配置快照
    pub fn save_config(&self, snapshot: &ConfigSnapshot) -> bool {
        self.save_config_at(snapshot, Utc::now())
    }

    pub fn save_config_at(&self, snapshot: &ConfigSnapshot, at: DateTime<Utc>) -> bool {
        let mut snapshot = snapshot.clone();
        snapshot.timestamp = Some(iso_timestamp(at));
        self.report("保存配置", self.save_stamped(&self.keys.config, &snapshot, at))
    }

    /// 读取配置快照
    pub fn load_config(&self) -> Option<ConfigSnapshot> {
        self.report_opt("读取配置", self.read_json(&self.keys.config))
    }

    /// 保存当前案例
    pub fn save_current_case(&self, case: &RawCase) -> bool {
        self.save_current_case_at(case, Utc::now())
    }

    pub fn save_current_case_at(&self, case: &RawCase, at: DateTime<Utc>) -> bool {
        let mut case = case.clone();
        case.timestamp = Some(iso_timestamp(at));
        self.report("保存当前案例", self.save_stamped(&self.keys.current_case, &case, at))
    }

    /// 读取当前案例
    pub fn load_current_case(&self) -> Option<RawCase> {
        self.report_opt("读取当前案例", self.read_json(&self.keys.current_case))
    }

    /// 最后一次保存的时间
    pub fn last_save_time(&self) -> Option<DateTime<Utc>> {
        let result = self.read_raw(&self.keys.last_save_time).and_then(|raw| {
            let Some(raw) = raw else {
                return Ok(None);
            };
            let millis: i64 = raw.trim().parse().context("保存时间不是整数")?;
            Ok(DateTime::from_timestamp_millis(millis))
        });
        self.report_opt("读取保存时间", result)
    }

    /// 清除所有保存的数据
    pub fn clear_all(&self) -> bool {
        let result = [
            &self.keys.config,
            &self.keys.current_case,
            &self.keys.last_save_time,
        ]
        .into_iter()
        .try_for_each(|key| self.remove(key));
        self.report("清除保存数据", result)
    }

    /// 是否保存过配置或案例
    pub fn has_saved_data(&self) -> bool {
        self.path_for(&self.keys.config).exists() || self.path_for(&self.keys.current_case).exists()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn save_stamped<T: Serialize>(&self, key: &str, value: &T, at: DateTime<Utc>) -> Result<()> {
        let content = serde_json::to_string_pretty(value).context("序列化失败")?;
        self.write_raw(key, &content)?;
        self.write_raw(&self.keys.last_save_time, &at.timestamp_millis().to_string())?;
        Ok(())
    }

    fn write_raw(&self, key: &str, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("无法创建存储目录: {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, content).with_context(|| format!("无法写入: {}", path.display()))?;
        debug!("已写入 {}", path.display());
        Ok(())
    }

    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&path).with_context(|| format!("无法读取: {}", path.display()))?;
        Ok(Some(content))
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_raw(key)? {
            Some(content) => {
                let value = serde_json::from_str(&content)
                    .with_context(|| format!("无法解析: {}", self.path_for(key).display()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("无法删除: {}", path.display()))?;
        }
        Ok(())
    }

    fn report(&self, action: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                error!("{}失败: {:#}", action, e);
                false
            }
        }
    }

    fn report_opt<T>(&self, action: &str, result: Result<Option<T>>) -> Option<T> {
        result.unwrap_or_else(|e| {
            error!("{}失败: {:#}", action, e);
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn temp_store(name: &str) -> FileCaseStore {
        let dir = std::env::temp_dir().join(format!(
            "sivpilot_store_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        FileCaseStore::new(dir, StorageKeys::default())
    }

    #[test]
    fn test_empty_store() {
        let store = temp_store("empty");
        assert!(!store.has_saved_data());
        assert!(store.load_config().is_none());
        assert!(store.load_current_case().is_none());
        assert!(store.last_save_time().is_none());
        assert!(store.clear_all());
    }

    #[test]
    fn test_save_and_load_current_case() {
        let store = temp_store("case");
        let at = Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap();
        let case = RawCase {
            eval_id: Some(json!(17)),
            prompt: "render a cone".to_string(),
            ..RawCase::default()
        };

        assert!(store.save_current_case_at(&case, at));
        assert!(store.has_saved_data());

        let loaded = store.load_current_case().unwrap();
        assert_eq!(loaded.eval_id_string(), "17");
        assert_eq!(loaded.prompt, "render a cone");
        assert_eq!(loaded.timestamp.as_deref(), Some("2025-05-04T12:00:00.000Z"));
        assert_eq!(store.last_save_time(), Some(at));

        assert!(store.clear_all());
        assert!(!store.has_saved_data());
    }

    #[test]
    fn test_save_and_load_config() {
        let store = temp_store("config");
        let snapshot = ConfigSnapshot {
            prompt: Some("sphere".to_string()),
            generator: Some("gen-a".to_string()),
            ..ConfigSnapshot::default()
        };

        assert!(store.save_config(&snapshot));
        let loaded = store.load_config().unwrap();
        assert_eq!(loaded.prompt.as_deref(), Some("sphere"));
        assert!(loaded.timestamp.is_some());
        assert!(store.clear_all());
    }

    #[test]
    fn test_snapshot_from_case() {
        let case = RawCase {
            prompt: "render a cone".to_string(),
            generator: "gen-a".to_string(),
            workflow: Some(json!({"steps": 2})),
            ..RawCase::default()
        };
        let snapshot = ConfigSnapshot::from_case(&case);

        assert_eq!(snapshot.prompt.as_deref(), Some("render a cone"));
        assert_eq!(snapshot.generator.as_deref(), Some("gen-a"));
        assert_eq!(snapshot.ground_truth, None);
        assert_eq!(snapshot.evaluator, None);
        assert_eq!(snapshot.workflow, Some(json!({"steps": 2})));
    }

    #[test]
    fn test_corrupt_file_loads_as_none() {
        let store = temp_store("corrupt");
        store.write_raw(&StorageKeys::default().current_case, "{not json").unwrap();

        assert!(store.load_current_case().is_none());
        assert!(store.has_saved_data());
        assert!(store.clear_all());
    }
}
