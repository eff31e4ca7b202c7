//! 单个 OpenRTB 2.5 竞价端点：请求校验 + BidResponse 构造

pub mod api;
pub mod bidding;
pub mod config;
pub mod error;
pub mod logging;
pub mod openrtb;
pub mod traffic;

use std::sync::Arc;

use bidding::{BidEvaluator, PlaceholderEvaluator};
use config::ConfigManager;
use logging::RuntimeLogger;

#[derive(Clone)]
pub struct AppState {
    pub runtime_logger: Arc<RuntimeLogger>,
    pub config: Arc<ConfigManager>,
    pub evaluator: Arc<dyn BidEvaluator>,
}

impl AppState {
    /// 使用占位出价逻辑
    pub fn new(config: Arc<ConfigManager>, runtime_logger: Arc<RuntimeLogger>) -> Self {
        Self::with_evaluator(config, runtime_logger, Arc::new(PlaceholderEvaluator::default()))
    }

    pub fn with_evaluator(
        config: Arc<ConfigManager>,
        runtime_logger: Arc<RuntimeLogger>,
        evaluator: Arc<dyn BidEvaluator>,
    ) -> Self {
        Self { runtime_logger, config, evaluator }
    }
}
