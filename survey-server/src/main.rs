use survey_server::{Config, Server, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 环境变量 + 配置
    dotenv::dotenv().ok();
    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    // 2. 日志：生产环境 JSON + 文件滚动，开发环境仅控制台
    let log_dir = config.log_dir();
    init_logger_with_file(
        &config.log_level,
        config.is_production(),
        if config.is_production() {
            log_dir.to_str()
        } else {
            None
        },
    )?;

    tracing::info!("Survey server starting...");

    // 3. 初始化服务器状态 (数据库 + 服务)
    let state = ServerState::initialize(&config).await;

    // 4. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
