//! `/bid` 端到端测试：在真实 listener 上启动服务并用 reqwest 调用

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use openrtb_bidder::api::{build_router, serve};
use openrtb_bidder::bidding::{BidEvaluator, PlaceholderEvaluator};
use openrtb_bidder::config::ConfigManager;
use openrtb_bidder::logging::RuntimeLogger;
use openrtb_bidder::openrtb::request::ValidatedBidRequest;
use openrtb_bidder::openrtb::response::{BidResponse, SeatBid};
use openrtb_bidder::traffic::{generate_traffic, TrafficConfig};
use openrtb_bidder::AppState;
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestServer {
    addr: SocketAddr,
    log_dir: PathBuf,
    logger: Arc<RuntimeLogger>,
    stop: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start(evaluator: Option<Arc<dyn BidEvaluator>>, max_body_bytes: usize) -> Self {
        let log_dir = std::env::temp_dir().join(format!("bidder-e2e-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&log_dir).unwrap();
        let log_dir_str = log_dir.to_str().unwrap();

        let config = Arc::new(ConfigManager::new(
            "127.0.0.1".parse().unwrap(),
            0,
            log_dir_str,
            max_body_bytes,
        ));
        let logger = RuntimeLogger::new(log_dir_str, "runtime", 64, 100, 50).unwrap();
        let state = match evaluator {
            Some(evaluator) => AppState::with_evaluator(config, logger.clone(), evaluator),
            None => AppState::new(config, logger.clone()),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, build_router(Arc::new(state)), async move {
            let _ = stopped.await;
        }));

        Self { addr, log_dir, logger, stop: Some(stop), handle }
    }

    fn url(&self) -> String {
        format!("http://{}/bid", self.addr)
    }

    async fn post(&self, body: &str) -> (StatusCode, Option<String>, String) {
        let resp = reqwest::Client::new()
            .post(self.url())
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (status, content_type, resp.text().await.unwrap())
    }

    /// 停止服务，刷新运行日志并返回写入的全部内容
    async fn stop(mut self) -> String {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await.unwrap().unwrap();
        self.logger.shutdown().await;

        let mut logs = String::new();
        for entry in std::fs::read_dir(&self.log_dir).unwrap() {
            let entry = entry.unwrap();
            if entry.file_name().to_string_lossy().starts_with("runtime_") {
                logs.push_str(&std::fs::read_to_string(entry.path()).unwrap());
            }
        }
        std::fs::remove_dir_all(&self.log_dir).ok();
        logs
    }
}

async fn default_server() -> TestServer {
    TestServer::start(None, 1024 * 1024).await
}

#[tokio::test]
async fn valid_request_gets_placeholder_bid() {
    let server = default_server().await;
    let (status, content_type, body) = server
        .post(r#"{"id":"req1","imp":[{"id":"imp1"}],"device":{"ua":"Mozilla/5.0"}}"#)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let response: BidResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.id, "req1");
    assert_eq!(response.version, "2.5");
    assert_eq!(response.seatbid.len(), 1);
    assert_eq!(response.seatbid[0].bid.len(), 1);
    assert_eq!(response.seatbid[0].bid[0].impid, "imp1");

    let logs = server.stop().await;
    assert!(logs.contains("bid_request"));
    assert!(logs.contains("req1"));
}

#[tokio::test]
async fn only_first_impression_is_bid_on() {
    let server = default_server().await;
    let (status, _, body) = server
        .post(r#"{"id":"r","imp":[{"id":"first"},{"id":"second"}],"device":{"ua":"x"}}"#)
        .await;
    assert_eq!(status, StatusCode::OK);
    let response: BidResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.seatbid[0].bid[0].impid, "first");
    server.stop().await;
}

#[tokio::test]
async fn non_post_methods_are_rejected() {
    let server = default_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(server.url()).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.text().await.unwrap(), "Method not allowed");

    let resp = client
        .put(server.url())
        .body(r#"{"id":"req1","imp":[{"id":"imp1"}],"device":{"ua":"x"}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    server.stop().await;
}

#[tokio::test]
async fn missing_fields_are_reported_in_check_order() {
    let server = default_server().await;
    let cases = [
        (r#"{"id":"","imp":[{"id":"imp1"}],"device":{"ua":"x"}}"#, "Request ID is required"),
        (r#"{"id":"r","imp":[],"device":{"ua":"x"}}"#, "At least one impression is required"),
        (r#"{"id":"r","imp":[{"id":""}],"device":null}"#, "Impression ID is required"),
        (r#"{"id":"r","imp":[{"id":"a"}],"device":null}"#, "Device object is required"),
        (r#"{"id":"r","imp":[{"id":"a"}],"device":{"ua":""}}"#, "Device UserAgent is required"),
        // null 按缺失处理
        (r#"{"id":null,"imp":[{"id":"imp1"}],"device":{"ua":"x"}}"#, "Request ID is required"),
        (r#"{"id":"r","imp":null,"device":{"ua":"x"}}"#, "At least one impression is required"),
        (r#"{"id":"r","imp":[null],"device":{"ua":"x"}}"#, "Impression ID is required"),
        (r#"{"id":"r","imp":[{"id":null}],"device":{"ua":"x"}}"#, "Impression ID is required"),
        (r#"{"id":"r","imp":[{"id":"a"}],"device":{"ua":null}}"#, "Device UserAgent is required"),
    ];
    for (body, reason) in cases {
        let (status, _, text) = server.post(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(text, reason);
    }

    let logs = server.stop().await;
    assert!(logs.contains("rejected"));
}

#[tokio::test]
async fn rejected_records_keep_the_request_id() {
    let server = default_server().await;
    let (status, _, text) = server
        .post(r#"{"id":"no-device-req","imp":[{"id":"a"}]}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Device object is required");

    let logs = server.stop().await;
    let record = logs
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|line| line["message"].as_str().map(str::to_string))
        .filter_map(|message| serde_json::from_str::<serde_json::Value>(&message).ok())
        .find(|record| record["outcome"] == "rejected")
        .unwrap();
    assert_eq!(record["request_id"], "no-device-req");
    assert_eq!(record["status"], 400);
}

#[tokio::test]
async fn invalid_json_is_a_client_error() {
    let server = default_server().await;
    for body in ["", "not json", r#"{"id":"req1","imp":[{"id":"imp1"}"#] {
        let (status, _, text) = server.post(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Invalid JSON");
    }
    // 收到非法输入后服务仍然可用
    let (status, _, _) = server
        .post(r#"{"id":"ok","imp":[{"id":"a"}],"device":{"ua":"x"}}"#)
        .await;
    assert_eq!(status, StatusCode::OK);
    server.stop().await;
}

#[tokio::test]
async fn oversized_body_is_a_bad_request() {
    let server = TestServer::start(None, 32).await;
    let (status, _, text) = server
        .post(r#"{"id":"a-rather-long-request-id","imp":[{"id":"imp1"}],"device":{"ua":"x"}}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Bad request");
    server.stop().await;
}

struct SecondPriceSeat;

impl BidEvaluator for SecondPriceSeat {
    fn evaluate(&self, request: &ValidatedBidRequest) -> SeatBid {
        let mut seat = PlaceholderEvaluator::default().evaluate(request);
        seat.seat = "second-price".to_string();
        seat.bid[0].price = 1.25;
        seat
    }
}

#[tokio::test]
async fn evaluator_is_pluggable() {
    let server = TestServer::start(Some(Arc::new(SecondPriceSeat)), 1024).await;
    let (status, _, body) = server
        .post(r#"{"id":"req9","imp":[{"id":"imp9"}],"device":{"ua":"x"}}"#)
        .await;
    assert_eq!(status, StatusCode::OK);
    let response: BidResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.seatbid[0].seat, "second-price");
    assert_eq!(response.seatbid[0].bid[0].price, 1.25);
    assert_eq!(response.seatbid[0].bid[0].impid, "imp9");
    server.stop().await;
}

#[tokio::test]
async fn traffic_generator_round_is_accepted() {
    let server = default_server().await;
    let config = TrafficConfig {
        target_url: server.url(),
        rps: 1000,
        concurrency: 5,
        timeout: Duration::from_secs(5),
        rounds: Some(2),
    };
    let stats = generate_traffic(&config, std::future::pending()).await.unwrap();
    assert_eq!(stats.ok, 10);
    assert_eq!(stats.total(), 10);
    server.stop().await;
}
