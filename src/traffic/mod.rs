// src/traffic/mod.rs

//! 压测流量生成：按固定 RPS 向 `/bid` 批量并发发送样例 OpenRTB 请求

use futures::future::join_all;
use rand::Rng;
use reqwest::Client;
use serde_json::{json, Value};
use std::future::Future;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

pub const DEFAULT_TARGET_URL: &str = "http://127.0.0.1:8080/bid";

#[derive(Debug, Clone)]
pub struct TrafficConfig {
    pub target_url: String,
    /// 目标每秒请求数，至少为 1
    pub rps: u32,
    /// 每轮并发请求数
    pub concurrency: usize,
    /// 单个请求超时
    pub timeout: Duration,
    /// 发送轮数，`None` 表示一直运行直到收到退出信号
    pub rounds: Option<u64>,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            rps: 100,
            concurrency: 20,
            timeout: Duration::from_secs(5),
            rounds: None,
        }
    }
}

/// 单个请求的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Status(u16),
    Timeout,
    Failed(String),
}

/// 一轮（或累计）的请求统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundStats {
    pub ok: u64,
    pub non_success: u64,
    pub timeouts: u64,
    pub errors: u64,
}

impl RoundStats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Status(code) if (200..300).contains(code) => self.ok += 1,
            Outcome::Status(_) => self.non_success += 1,
            Outcome::Timeout => self.timeouts += 1,
            Outcome::Failed(_) => self.errors += 1,
        }
    }

    pub fn merge(&mut self, other: RoundStats) {
        self.ok += other.ok;
        self.non_success += other.non_success;
        self.timeouts += other.timeouts;
        self.errors += other.errors;
    }

    pub fn total(&self) -> u64 {
        self.ok + self.non_success + self.timeouts + self.errors
    }
}

/// 两轮之间的等待时间：每个请求间隔 1/rps 秒，一轮 `concurrency` 个
pub fn round_delay(rps: u32, concurrency: usize) -> Duration {
    Duration::from_secs_f64(concurrency as f64 / f64::from(rps.max(1)))
}

/// 构造一个样例 OpenRTB 2.5 BidRequest，id 随机
pub fn sample_request() -> Value {
    let id = rand::thread_rng().gen_range(100_000..1_000_000);
    json!({
        "id": format!("request-{}", id),
        "imp": [
            {
                "id": "imp-123",
                "banner": { "w": 300, "h": 250 },
                "displaymanager": "openrtb-sim",
                "displaymanagerver": "1.0",
                "tagid": "tag-456",
                "bidfloor": 0.5,
                "bidfloorcur": "USD"
            }
        ],
        "device": {
            "ua": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
            "ip": "192.168.1.100",
            "os": "Mac OS X",
            "model": "MacBook Pro",
            "connectiontype": 2
        },
        "user": { "id": "user-789" },
        "tmax": 1000
    })
}

/// 发送单个请求
pub async fn send_request(client: &Client, target_url: &str, limit: Duration) -> Outcome {
    let body = sample_request();
    let response = timeout(limit, client.post(target_url).timeout(limit).json(&body).send()).await;
    match response {
        Ok(Ok(resp)) => {
            let status = resp.status();
            let text = match resp.text().await {
                Ok(text) => text,
                Err(e) => format!("<failed to read response body: {}>", e),
            };
            if status.is_success() {
                debug!(status = status.as_u16(), "Response: {}", text);
            } else {
                warn!(
                    status = status.as_u16(),
                    "Request to {} failed with status {}: {}", target_url, status, text
                );
            }
            Outcome::Status(status.as_u16())
        }
        Ok(Err(e)) if e.is_timeout() => {
            warn!("Request to {} timed out after {:?}: {}", target_url, limit, e);
            Outcome::Timeout
        }
        Ok(Err(e)) => {
            warn!("Error sending request to {}: {}", target_url, e);
            Outcome::Failed(e.to_string())
        }
        Err(_) => {
            warn!("Request to {} timed out after {:?}", target_url, limit);
            Outcome::Timeout
        }
    }
}

/// 并发发送一轮请求
pub async fn run_round(client: &Client, config: &TrafficConfig) -> RoundStats {
    let tasks = (0..config.concurrency)
        .map(|_| send_request(client, &config.target_url, config.timeout));
    let mut stats = RoundStats::default();
    for outcome in join_all(tasks).await {
        stats.record(&outcome);
    }
    stats
}

/// 持续生成流量，直到跑完指定轮数或 `shutdown` 完成，返回累计统计
pub async fn generate_traffic<F>(config: &TrafficConfig, shutdown: F) -> Result<RoundStats, reqwest::Error>
where
    F: Future<Output = ()>,
{
    let client = Client::builder().build()?;
    let delay = round_delay(config.rps, config.concurrency);
    info!(
        "Sending requests to {} at {} RPS (delay: {:.6} seconds)",
        config.target_url,
        config.rps,
        1.0 / f64::from(config.rps.max(1))
    );

    let mut totals = RoundStats::default();
    let mut round = 0u64;
    tokio::pin!(shutdown);
    loop {
        if config.rounds.is_some_and(|limit| round >= limit) {
            break;
        }
        tokio::select! {
            stats = run_round(&client, config) => {
                totals.merge(stats);
                round += 1;
                debug!(round, ?stats, "round finished");
            }
            _ = &mut shutdown => break,
        }
        if config.rounds.is_some_and(|limit| round >= limit) {
            break;
        }
        tokio::select! {
            _ = sleep(delay) => {}
            _ = &mut shutdown => break,
        }
    }

    info!(
        rounds = round,
        ok = totals.ok,
        non_success = totals.non_success,
        timeouts = totals.timeouts,
        errors = totals.errors,
        "traffic generation finished"
    );
    Ok(totals)
}
