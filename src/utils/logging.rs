//! 日志工具模块
//!
//! 提供日志初始化和启动/关闭横幅的辅助函数

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use crate::config::Config;

/// 日志句柄，配置加载完成后用来调整日志级别
pub struct LogHandle {
    filter: Option<reload::Handle<EnvFilter, Registry>>,
    from_env: bool,
}

/// 初始化日志
///
/// 在读取配置之前调用，保证配置阶段的告警也能输出。
/// 优先使用 `RUST_LOG`；未设置时先用 `info`，之后由 `LogHandle::apply_config` 调整。
/// 重复调用是安全的（测试里常见），后续调用不会替换已安装的订阅器。
pub fn init() -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new("info"), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok();

    LogHandle {
        filter: installed.then_some(handle),
        from_env,
    }
}

impl LogHandle {
    /// 按配置切换日志级别；设置了 `RUST_LOG` 时以环境变量为准
    pub fn apply_config(&self, config: &Config) {
        if self.from_env || !config.verbose_logging {
            return;
        }
        if let Some(filter) = &self.filter {
            if let Err(e) = filter.reload(EnvFilter::new("debug")) {
                warn!("⚠️ 无法切换到 debug 日志级别: {}", e);
            }
        }
    }
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 排序服务启动 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("📊 顺序策略: {}", config.ordering_policy);
    match config.concurrency_limit() {
        Some(limit) => info!("📊 最大并发任务数: {}", limit),
        None => info!("📊 最大并发任务数: 不限制"),
    }
    match config.batch_timeout() {
        Some(timeout) => info!("⏱️ 整批超时: {} ms", timeout.as_millis()),
        None => info!("⏱️ 整批超时: 无"),
    }
    info!("{}", "=".repeat(60));
}

/// 记录监听地址
pub fn log_listening(addr: &str, port: u16) {
    info!("✓ Server is listening on port {} ({})", port, addr);
}

/// 记录关闭信息
pub fn log_shutdown() {
    info!("\n{}", "─".repeat(60));
    info!("👋 收到退出信号，停止接收新请求");
    info!("完成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "─".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = init();
        let second = init();
        assert!(second.filter.is_none());

        let verbose = Config {
            verbose_logging: true,
            ..Config::default()
        };
        first.apply_config(&verbose);
        second.apply_config(&verbose);
        log_startup(&verbose);
    }
}
