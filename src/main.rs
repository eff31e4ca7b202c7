// src/main.rs

use clap::Parser;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use openrtb_bidder::api::{build_router, serve};
use openrtb_bidder::config::config_manager::DEFAULT_MAX_BODY_BYTES;
use openrtb_bidder::config::ConfigManager;
use openrtb_bidder::logging::{init_tracing, LogLevel, RuntimeLogger};
use openrtb_bidder::AppState;

#[derive(Parser, Debug)]
#[command(version, about = "An OpenRTB 2.5 bidder endpoint")]
struct CliArgs {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// 请求体大小上限（字节）
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = CliArgs::parse();
    let config = Arc::new(ConfigManager::new(
        args.host,
        args.port,
        &args.log_dir,
        args.max_body_bytes,
    ));

    std::fs::create_dir_all(&config.log_dir)?;

    // 初始化全局 tracing 日志，guard 持有到进程退出
    let _guard = init_tracing(&config.log_dir)?;
    info!("Bidder starting on {}", config.bind_addr);

    // 初始化运行日志记录器（用于记录服务运行状态、每个请求的处理结果）
    let runtime_logger = RuntimeLogger::new(&config.log_dir, "runtime", 1000, 100, 1000)?;
    runtime_logger.log(LogLevel::Info, "Bidder is starting...").await;

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_addr, e);
            runtime_logger
                .log(LogLevel::Error, &format!("Failed to bind {}: {}", config.bind_addr, e))
                .await;
            runtime_logger.shutdown().await;
            return Err(e.into());
        }
    };

    let state = Arc::new(AppState::new(config.clone(), runtime_logger.clone()));
    let app = build_router(state);
    runtime_logger
        .log(LogLevel::Info, &format!("Bidder running at http://{}/bid", config.bind_addr))
        .await;

    let shutdown = {
        let runtime_logger = runtime_logger.clone();
        async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            runtime_logger.log(LogLevel::Info, "Shutting down gracefully...").await;
        }
    };

    let served = serve(listener, app, shutdown).await;
    if let Err(e) = &served {
        error!("Server error: {}", e);
        runtime_logger.log(LogLevel::Error, &format!("Server error: {}", e)).await;
    }

    runtime_logger.log(LogLevel::Info, "Bidder shut down.").await;
    runtime_logger.shutdown().await;
    served.map_err(Into::into)
}
