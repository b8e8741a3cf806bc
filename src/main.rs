use crate::config::Config;
use crate::startup::startup::Application;
use crate::utils::logger::init_logger;
use anyhow::Context;

mod config;
mod errors;
mod exporters;
mod infrastructure;
mod models;
mod services;
mod startup;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 先加载 .env，LOG_LEVEL / APP__* 都可能在里面
    dotenvy::dotenv().ok();
    init_logger();

    log_info!("Starting internal transaction export...");

    // 1. 加载配置
    let config = Config::load().context("Failed to load application configuration")?;

    // 2. 构建应用实例（provider/导出器/特殊 trace）
    let application = Application::build(config).context("Application building failed")?;

    // 3. 执行导出
    application
        .run()
        .await
        .context("Internal transaction export failed")?;

    log_info!("Export finished.");
    Ok(())
}
