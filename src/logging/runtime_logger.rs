// src/logging/runtime_logger.rs

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};
use chrono::{FixedOffset, Utc};
use serde_json::json;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Duration};
use tracing::{error, info, warn};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;

/// 日志文件保留时长（小时）
const RETENTION_HOURS: u64 = 72;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条日志消息
pub struct LogEntry {
    pub level: LogLevel,
    pub content: String,
}

/// 运行日志管理器（RuntimeLogger）
/// 将运行时日志按日志级别分流到不同的日志文件中。
pub struct RuntimeLogger {
    // shutdown 时取走，关闭通道
    sender: Mutex<Option<Sender<LogEntry>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    cleaner: JoinHandle<()>,
}

impl RuntimeLogger {
    /// 创建一个新的 RuntimeLogger
    ///
    /// - `log_dir`: 日志文件存放目录
    /// - `file_prefix`: 文件前缀，例如 "runtime"（最终文件名形如 runtime_info.json.<小时>）
    /// - `buffer_size`: mpsc 通道缓冲区大小
    /// - `batch_size`: 每个日志级别批量写入的日志条数
    /// - `flush_interval`: 定时刷新日志的时间间隔（毫秒）
    pub fn new(
        log_dir: &str,
        file_prefix: &str,
        buffer_size: usize,
        batch_size: usize,
        flush_interval: u64,
    ) -> Result<Arc<Self>, InitError> {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let mut log_files = HashMap::new();
        for level in LogLevel::ALL {
            let file_name = format!("{}_{}.json", file_prefix, level.as_str().to_lowercase());
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::HOURLY)
                .filename_prefix(file_name)
                .build(log_dir)?;
            log_files.insert(level, Arc::new(appender));
        }

        let writer = tokio::spawn(Self::background_log_writer(
            log_files,
            receiver,
            batch_size.max(1),
            flush_interval.max(1),
        ));

        // 后台任务定期清理过期日志文件
        let cleaner = {
            let log_dir = log_dir.to_string();
            tokio::spawn(async move {
                let cleanup_interval = Duration::from_secs(3600);
                loop {
                    Self::cleanup_old_logs(&log_dir, RETENTION_HOURS).await;
                    time::sleep(cleanup_interval).await;
                }
            })
        };

        Ok(Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(writer)),
            cleaner,
        }))
    }

    /// 记录运行日志
    pub async fn log(&self, level: LogLevel, message: &str) {
        let sender = match self.sender.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let Some(sender) = sender else {
            warn!(%level, entry = message, "runtime logger already shut down, dropping entry");
            return;
        };

        let entry = LogEntry {
            level,
            content: json!({
                "timestamp": timestamp(),
                "level": level.as_str(),
                "message": message,
            })
            .to_string(),
        };

        if let Err(e) = sender.send(entry).await {
            error!("Failed to send runtime log message: {}", e);
        }
    }

    /// 后台日志写入任务，通道关闭后把剩余缓冲全部落盘再退出
    async fn background_log_writer(
        log_files: HashMap<LogLevel, Arc<RollingFileAppender>>,
        mut receiver: Receiver<LogEntry>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        // 每个日志级别独立的缓冲区
        let mut buffers: HashMap<LogLevel, Vec<String>> =
            LogLevel::ALL.iter().map(|level| (*level, Vec::new())).collect();
        let mut interval = time::interval(Duration::from_millis(flush_interval));
        loop {
            tokio::select! {
                maybe_entry = receiver.recv() => {
                    let Some(entry) = maybe_entry else {
                        Self::flush_all(&log_files, &mut buffers).await;
                        break;
                    };
                    let buffer = buffers.entry(entry.level).or_default();
                    buffer.push(entry.content);
                    if buffer.len() >= batch_size {
                        if let Some(appender) = log_files.get(&entry.level) {
                            Self::write_logs_to_disk(appender.clone(), std::mem::take(buffer)).await;
                        }
                    }
                },
                _ = interval.tick() => {
                    Self::flush_all(&log_files, &mut buffers).await;
                }
            }
        }
    }

    async fn flush_all(
        log_files: &HashMap<LogLevel, Arc<RollingFileAppender>>,
        buffers: &mut HashMap<LogLevel, Vec<String>>,
    ) {
        for (level, buffer) in buffers.iter_mut() {
            if buffer.is_empty() {
                continue;
            }
            if let Some(appender) = log_files.get(level) {
                Self::write_logs_to_disk(appender.clone(), std::mem::take(buffer)).await;
            }
        }
    }

    async fn write_logs_to_disk(file: Arc<RollingFileAppender>, buffer: Vec<String>) {
        let content = buffer.join("\n") + "\n";
        let result = task::spawn_blocking(move || {
            let mut writer = file.make_writer();
            writer.write_all(content.as_bytes())?;
            writer.flush()
        })
        .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to write runtime logs: {}", e),
            Err(e) => error!("Runtime log writer task failed: {}", e),
        }
    }

    async fn cleanup_old_logs(log_dir: &str, retention_hours: u64) {
        use std::time::{Duration as StdDuration, SystemTime};
        let retention_duration = StdDuration::from_secs(retention_hours * 3600);
        let now = SystemTime::now();
        let mut dir = match tokio::fs::read_dir(log_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Failed to read log directory {}: {}", log_dir, e);
                return;
            }
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            let Ok(metadata) = entry.metadata().await else { continue };
            let Ok(modified) = metadata.modified() else { continue };
            if now.duration_since(modified).unwrap_or_default() <= retention_duration {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("Deleted old log file: {:?}", path),
                Err(e) => warn!("Failed to delete old log file {:?}: {}", path, e),
            }
        }
    }

    /// 关闭通道并等待后台任务把缓冲写完
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        let writer = match self.writer.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                error!("Runtime log writer did not finish cleanly: {}", e);
            }
        }
        self.cleaner.abort();
    }
}

/// 东八区 RFC3339 时间戳
fn timestamp() -> String {
    match FixedOffset::east_opt(8 * 3600) {
        Some(tz) => Utc::now().with_timezone(&tz).to_rfc3339(),
        None => Utc::now().to_rfc3339(),
    }
}
