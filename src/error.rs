use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 截图相关错误
    #[error("截图错误: {0}")]
    Capture(#[from] CaptureError),
    /// 导出流程错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动无头浏览器失败
    #[error("启动无头浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 截图相关错误
#[derive(Debug, Error)]
pub enum CaptureError {
    /// 页面上找不到预览元素
    #[error("找不到预览元素: {selector}")]
    ElementNotFound { selector: String },
    /// 子文档不可访问（跨域或尚未加载）
    #[error("子文档不可访问: {label}")]
    FrameInaccessible { label: String },
    /// 光栅化失败
    #[error("光栅化失败 ({label}): {reason}")]
    RasterizeFailed { label: String, reason: String },
    /// 图像编解码失败
    #[error("图像编解码失败: {0}")]
    Codec(String),
}

/// 导出流程错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 预览元素缺失，导出不会开始
    #[error("预览元素不存在: {which}")]
    MissingPreview { which: &'static str },
    /// 提交请求失败（网络或解析错误）
    #[error("导出失败: {source}")]
    SubmissionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 提交接口返回 success != true
    #[error("导出失败: 服务端未确认 ({message})")]
    Rejected { message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建预览元素缺失错误
    pub fn missing_preview(which: &'static str) -> Self {
        AppError::Export(ExportError::MissingPreview { which })
    }

    /// 创建提交失败错误
    pub fn submission_failed(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        AppError::Export(ExportError::SubmissionFailed {
            source: source.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
