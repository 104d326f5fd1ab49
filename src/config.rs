use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 本地持久化使用的存储键
///
/// 在构造 `FileCaseStore` 时注入，不再使用进程级的全局常量
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageKeys {
    /// 配置快照
    pub config: String,
    /// 当前案例快照
    pub current_case: String,
    /// 最后保存时间
    pub last_save_time: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            config: "sivpilot_config".to_string(),
            current_case: "sivpilot_current_case".to_string(),
            last_save_time: "sivpilot_last_save".to_string(),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 浏览器 ---
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 评测页面 URL
    pub target_url: String,
    /// 是否自行启动无头浏览器（否则连接已打开的浏览器）
    pub headless: bool,
    /// 无头模式下的浏览器可执行文件
    pub chrome_executable: Option<String>,

    // --- 预览区域 ---
    /// 生成代码预览的 CSS 选择器
    pub generated_preview_selector: String,
    /// Ground truth 预览的 CSS 选择器
    pub truth_preview_selector: String,

    // --- 时序 ---
    /// 开始截图前的整体等待（毫秒）
    pub export_settle_ms: u64,
    /// 轮询子文档的间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 最大轮询次数
    pub max_poll_attempts: u32,
    /// 检测到画布后额外等待（毫秒）
    pub render_settle_ms: u64,
    /// 没有子文档时的短暂等待（毫秒）
    pub no_frame_delay_ms: u64,

    // --- 截图 ---
    /// 截图失败时是否在导出数据中放入占位图（否则为 null）
    pub embed_placeholder_on_failure: bool,

    // --- 提交 ---
    /// 导出接口地址
    pub export_endpoint: String,
    /// 提交超时（秒）
    pub submit_timeout_secs: u64,

    // --- 持久化 ---
    /// 本地存储目录
    pub store_dir: String,
    /// 存储键
    pub storage_keys: StorageKeys,

    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: "http://localhost:5173/#/evaluate".to_string(),
            headless: false,
            chrome_executable: None,
            generated_preview_selector: "#generated-preview".to_string(),
            truth_preview_selector: "#truth-preview".to_string(),
            export_settle_ms: 1000,
            poll_interval_ms: 100,
            max_poll_attempts: 30,
            render_settle_ms: 1500,
            no_frame_delay_ms: 100,
            embed_placeholder_on_failure: true,
            export_endpoint: "http://127.0.0.1:5000/export".to_string(),
            submit_timeout_secs: 30,
            store_dir: ".sivpilot".to_string(),
            storage_keys: StorageKeys::default(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 按 默认值 → TOML 文件 → 环境变量 的顺序加载配置
    ///
    /// 配置文件路径取自 `SIVPILOT_CONFIG`，未设置时尝试当前目录下的 `sivpilot.toml`
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("SIVPILOT_CONFIG").unwrap_or_else(|_| "sivpilot.toml".to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(Path::new(&path))?
        } else {
            Self::default()
        };
        Ok(base.with_env())
    }

    /// 从 TOML 文件读取配置，缺失字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|source| {
            ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            }
            .into()
        })
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 只读取环境变量（基于默认值）
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 用环境变量覆盖当前配置，无法解析的值被忽略
    pub fn with_env(self) -> Self {
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(self.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(self.target_url),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            generated_preview_selector: std::env::var("GENERATED_PREVIEW_SELECTOR").unwrap_or(self.generated_preview_selector),
            truth_preview_selector: std::env::var("TRUTH_PREVIEW_SELECTOR").unwrap_or(self.truth_preview_selector),
            export_settle_ms: env_parse("EXPORT_SETTLE_MS").unwrap_or(self.export_settle_ms),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS").unwrap_or(self.poll_interval_ms),
            max_poll_attempts: env_parse("MAX_POLL_ATTEMPTS").unwrap_or(self.max_poll_attempts),
            render_settle_ms: env_parse("RENDER_SETTLE_MS").unwrap_or(self.render_settle_ms),
            no_frame_delay_ms: env_parse("NO_FRAME_DELAY_MS").unwrap_or(self.no_frame_delay_ms),
            embed_placeholder_on_failure: env_parse("EMBED_PLACEHOLDER_ON_FAILURE").unwrap_or(self.embed_placeholder_on_failure),
            export_endpoint: std::env::var("EXPORT_ENDPOINT").unwrap_or(self.export_endpoint),
            submit_timeout_secs: env_parse("SUBMIT_TIMEOUT_SECS").unwrap_or(self.submit_timeout_secs),
            store_dir: std::env::var("STORE_DIR").unwrap_or(self.store_dir),
            storage_keys: self.storage_keys,
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    pub fn export_settle(&self) -> Duration {
        Duration::from_millis(self.export_settle_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            browser_debug_port = 2001
            export_endpoint = "http://eval.local/api/export"

            [storage_keys]
            current_case = "custom_case"
            "#,
        )
        .unwrap();

        assert_eq!(config.browser_debug_port, 2001);
        assert_eq!(config.export_endpoint, "http://eval.local/api/export");
        assert_eq!(config.max_poll_attempts, 30);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.storage_keys.current_case, "custom_case");
        assert_eq!(config.storage_keys.config, "sivpilot_config");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml_str("browser_debug_port = \"abc\"").is_err());
    }
}
