// src/bin/traffic.rs

use clap::Parser;
use tokio::signal;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use openrtb_bidder::traffic::{generate_traffic, TrafficConfig, DEFAULT_TARGET_URL};

#[derive(Parser, Debug)]
#[command(version, about = "Generates OpenRTB bid request traffic against a /bid endpoint")]
struct TrafficArgs {
    /// 目标地址
    #[arg(default_value = DEFAULT_TARGET_URL)]
    target_url: String,
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    rps: u32,
    #[arg(long, default_value_t = 20)]
    concurrency: usize,
    /// 单个请求超时（秒）
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
    /// 发送轮数，不指定则一直运行到 Ctrl-C
    #[arg(long)]
    rounds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = TrafficArgs::parse();
    let config = TrafficConfig {
        target_url: args.target_url,
        rps: args.rps,
        concurrency: args.concurrency,
        timeout: Duration::from_secs(args.timeout_secs),
        rounds: args.rounds,
    };
    info!("Using target URL: {}", config.target_url);

    let shutdown = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let totals = generate_traffic(&config, shutdown).await?;
    info!(
        "Sent {} requests: {} ok, {} non-2xx, {} timed out, {} failed",
        totals.total(),
        totals.ok,
        totals.non_success,
        totals.timeouts,
        totals.errors
    );
    Ok(())
}
