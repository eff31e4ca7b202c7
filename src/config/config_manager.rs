use std::net::{IpAddr, SocketAddr};

/// 默认请求体上限：1 MiB
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// 服务运行配置
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigManager {
    pub bind_addr: SocketAddr,
    pub log_dir: String,
    /// 超过该大小的请求体按读取失败处理
    pub max_body_bytes: usize,
}

impl ConfigManager {
    pub fn new(host: IpAddr, port: u16, log_dir: &str, max_body_bytes: usize) -> Self {
        ConfigManager {
            bind_addr: SocketAddr::new(host, port),
            log_dir: log_dir.to_string(),
            max_body_bytes,
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        ConfigManager::new(
            IpAddr::from([0, 0, 0, 0]),
            8080,
            "logs",
            DEFAULT_MAX_BODY_BYTES,
        )
    }
}
