use anyhow::Result;
use sort_batch_service::utils::logging;
use sort_batch_service::App;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志（先于配置，配置阶段的告警也能输出）
    let log_handle = logging::init();

    // 加载配置并初始化应用
    let app = App::load()?;
    log_handle.apply_config(app.config());

    // 运行应用
    app.run().await?;

    Ok(())
}
