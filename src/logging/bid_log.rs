use serde::{Deserialize, Serialize};
use chrono::Utc;

use crate::error::BidError;
use crate::logging::runtime_logger::LogLevel;
use crate::openrtb::response::BidResponse;

/// **竞价请求日志**，每个请求一条
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BidLog {
    pub timestamp: String,          // 记录时间
    pub log_type: String,           // 固定为 "bid_request"
    pub request_id: Option<String>, // 校验失败时可能拿不到
    pub outcome: String,            // "success" / "rejected" / "failed"
    pub status: u16,                // 返回的 HTTP 状态码
    pub reason: Option<String>,     // 失败原因
    pub impid: Option<String>,      // 出价对应的广告位
    pub price: Option<f64>,         // 出价
}

impl BidLog {
    /// **成功返回 BidResponse**
    pub fn success(response: &BidResponse) -> Self {
        let bid = response.seatbid.first().and_then(|seat| seat.bid.first());
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "bid_request".to_string(),
            request_id: Some(response.id.clone()),
            outcome: "success".to_string(),
            status: 200,
            reason: None,
            impid: bid.map(|b| b.impid.clone()),
            price: bid.map(|b| b.price),
        }
    }

    /// **请求失败**：客户端错误记为 rejected，服务端错误记为 failed
    pub fn failure(request_id: Option<&str>, err: &BidError) -> Self {
        let outcome = if err.is_server_fault() { "failed" } else { "rejected" };
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "bid_request".to_string(),
            request_id: request_id.map(str::to_string),
            outcome: outcome.to_string(),
            status: err.status().as_u16(),
            reason: Some(err.to_string()),
            impid: None,
            price: None,
        }
    }

    pub fn level(&self) -> LogLevel {
        match self.status {
            s if s >= 500 => LogLevel::Error,
            s if s >= 400 => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }

    pub fn to_json(&self) -> String {
        // 只含字符串和数字，序列化不会失败
        serde_json::to_string(self).unwrap_or_default()
    }
}
