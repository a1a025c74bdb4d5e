//! 区块链充值钱包服务主入口

use std::sync::Arc;

use anyhow::Result;
use blockchain_wallets::{
    api,
    app_state::AppState,
    config::Config,
    infrastructure::{db, logging},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 指定的文件优先）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate()?;

    // 3. 初始化日志
    logging::init_logging(&config.logging)?;
    tracing::info!("Starting blockchain wallets service");

    // 4. 连接数据库（可选）
    let pool = match config.database.url {
        Some(_) => {
            let pool = db::init_pool(&config.database).await?;
            tracing::info!("Database connected");

            if std::env::var("SKIP_MIGRATIONS").is_err() {
                db::run_migrations(&pool).await?;
                tracing::info!("Database migrations completed");
            } else {
                tracing::info!("Database migrations skipped (SKIP_MIGRATIONS=1)");
            }
            Some(pool)
        }
        None => None,
    };

    // 5. 组装服务并启动能力发现
    let bind_addr = config.server.bind_addr.clone();
    let state = Arc::new(AppState::build(config, pool));
    state.start().await;

    let app = api::routes(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6. 停止后台任务
    state.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
