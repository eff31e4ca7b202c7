use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::bidding::{build_response, check_required, decode_body};
use crate::error::BidError;
use crate::logging::BidLog;
use crate::AppState;

/// **处理 OpenRTB 竞价请求**
///
/// 校验 → 构造 BidResponse → JSON 编码；任何一步失败都直接返回错误，不再继续。
pub async fn handle_bid_request(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Body,
) -> Response {
    let decoded = match decode_body(&method, body, state.config.max_body_bytes).await {
        Ok(decoded) => decoded,
        Err(err) => return reject(&state, None, err).await,
    };
    // 解析成功后 id 已知，字段校验失败时也记录到日志
    let request_id = Some(decoded.id.clone()).filter(|id| !id.is_empty());
    let request = match check_required(decoded) {
        Ok(request) => request,
        Err(err) => return reject(&state, request_id.as_deref(), err).await,
    };

    let response = build_response(&request, state.evaluator.as_ref());
    let payload = match encode_response(&response) {
        Ok(payload) => payload,
        Err(err) => return reject(&state, Some(request.id()), err).await,
    };

    let record = BidLog::success(&response);
    state.runtime_logger.log(record.level(), &record.to_json()).await;
    info!(
        request_id = %response.id,
        "Successfully sent bid response at {}",
        Utc::now().to_rfc3339()
    );

    ([(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

/// 将响应编码为 JSON 字节
pub fn encode_response<T: Serialize>(response: &T) -> Result<Vec<u8>, BidError> {
    serde_json::to_vec(response).map_err(|e| {
        error!(error = %e, "Error encoding JSON");
        BidError::EncodingFailure(e.to_string())
    })
}

async fn reject(state: &AppState, request_id: Option<&str>, err: BidError) -> Response {
    let record = BidLog::failure(request_id, &err);
    state.runtime_logger.log(record.level(), &record.to_json()).await;
    err.into_response()
}
