use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 监听端口、读取配置文件等 IO 错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 编排层错误
///
/// 排序本身不会失败，这里只描述并发任务层面的故障。
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// 子任务 panic 或被取消，未能交付结果
    #[error("第 {index} 个数组的排序任务执行失败: {reason}")]
    TaskFailed { index: usize, reason: String },
    /// 整批超时
    #[error("批量排序超时 (限制 {limit_ms} ms, 已完成 {completed}/{total})")]
    Timeout {
        limit_ms: u64,
        completed: usize,
        total: usize,
    },
    /// 任务全部结束但某个位置没有结果
    #[error("第 {index} 个数组缺少排序结果")]
    MissingResult { index: usize },
}

/// HTTP 接口错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 请求体不是合法的 `{"to_sort": [[int]]}`
    #[error("invalid JSON payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// 编排失败
    #[error("{0}")]
    Orchestration(#[from] OrchestratorError),
}

impl ConfigError {
    /// 创建环境变量解析错误
    pub fn env_parse_failed(
        var_name: impl Into<String>,
        value: impl Into<String>,
        expected_type: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.into(),
            value: value.into(),
            expected_type: expected_type.into(),
        }
    }
}

impl OrchestratorError {
    /// 由 tokio 的 JoinError 构造任务失败错误
    pub fn task_failed(index: usize, err: &tokio::task::JoinError) -> Self {
        let reason = if err.is_panic() {
            "任务 panic".to_string()
        } else if err.is_cancelled() {
            "任务被取消".to_string()
        } else {
            err.to_string()
        };
        OrchestratorError::TaskFailed { index, reason }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
