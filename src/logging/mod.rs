pub mod bid_log;
pub mod runtime_logger;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

pub use bid_log::BidLog;
pub use runtime_logger::{LogLevel, RuntimeLogger};

/// 初始化全局 tracing 日志：JSON 格式写入按小时滚动的文件
///
/// 返回的 guard 需要一直持有到进程退出，否则缓冲中的日志会丢失。
pub fn init_tracing(log_dir: &str) -> Result<WorkerGuard, Box<dyn std::error::Error + Send + Sync>> {
    let log_file = RollingFileAppender::builder()
        .rotation(Rotation::HOURLY)
        .filename_prefix("bidder_log.json")
        .build(log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().json().with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
