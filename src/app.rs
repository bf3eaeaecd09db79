use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tracing::error;

use crate::api::{build_router, AppState};
use crate::config::Config;
use crate::error::AppResult;
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    router: Router,
}

impl App {
    /// 读取配置（TOML 文件 + 环境变量）并初始化
    pub fn load() -> AppResult<Self> {
        let config = Config::load()?;
        Self::initialize(config)
    }

    /// 初始化应用：打印启动信息并构造路由
    pub fn initialize(config: Config) -> AppResult<Self> {
        logging::log_startup(&config);

        let router = build_router(AppState::from_config(&config));
        Ok(Self { config, router })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 绑定端口并运行，直到收到 Ctrl-C
    pub async fn run(self) -> AppResult<()> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            error!("❌ 无法监听 {}: {}", addr, e);
            e
        })?;

        self.serve(listener, shutdown_signal()).await
    }

    /// 在给定的 listener 上运行，`shutdown` 完成后优雅退出
    pub async fn serve<S>(self, listener: TcpListener, shutdown: S) -> AppResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        logging::log_listening(&local.ip().to_string(), local.port());

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        logging::log_shutdown();
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("❌ 无法监听退出信号: {}", e);
        // 监听失败时继续提供服务
        std::future::pending::<()>().await;
    }
}
