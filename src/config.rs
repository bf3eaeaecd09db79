use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "SORT_SERVICE_CONFIG";

/// 结果收集顺序
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPolicy {
    /// 按提交顺序重组：输出第 i 项对应输入第 i 项
    #[default]
    Submission,
    /// 按完成顺序收集（兼容旧行为，输入输出位置不保证对应）
    Completion,
}

impl FromStr for OrderingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submission" => Ok(OrderingPolicy::Submission),
            "completion" => Ok(OrderingPolicy::Completion),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingPolicy::Submission => write!(f, "submission"),
            OrderingPolicy::Completion => write!(f, "completion"),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 监听地址
    pub bind_addr: String,
    /// 监听端口
    pub port: u16,
    /// 结果收集顺序
    pub ordering_policy: OrderingPolicy,
    /// 同时执行的排序任务上限，0 表示不限制
    pub max_concurrent_tasks: usize,
    /// 整批超时（毫秒），0 表示不设超时
    pub batch_timeout_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
            ordering_policy: OrderingPolicy::Submission,
            max_concurrent_tasks: 0,
            batch_timeout_ms: 0,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 读取配置：先读 `SORT_SERVICE_CONFIG` 指向的 TOML 文件（如有），再用环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::from_toml_file(path)?,
            _ => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 只从环境变量读取，解析失败的项回退到默认值
    pub fn from_env() -> Self {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ {}，使用默认配置", e);
                Self::default()
            }
        }
    }

    /// 只从环境变量读取，任何一项解析失败都返回错误
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取，缺省字段取默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// 用查找函数提供的值覆盖当前配置，便于测试时不依赖进程环境
    pub fn with_overrides<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(self.bind_addr),
            port: parse_var(&lookup, "PORT", "u16")?.unwrap_or(self.port),
            ordering_policy: parse_var(&lookup, "ORDERING_POLICY", "submission|completion")?
                .unwrap_or(self.ordering_policy),
            max_concurrent_tasks: parse_var(&lookup, "MAX_CONCURRENT_TASKS", "usize")?
                .unwrap_or(self.max_concurrent_tasks),
            batch_timeout_ms: parse_var(&lookup, "BATCH_TIMEOUT_MS", "u64")?
                .unwrap_or(self.batch_timeout_ms),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }

    /// `bind_addr:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        (self.batch_timeout_ms > 0).then(|| Duration::from_millis(self.batch_timeout_ms))
    }

    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrent_tasks > 0).then_some(self.max_concurrent_tasks)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, expected: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse_failed(name, raw, expected)),
    }
}
