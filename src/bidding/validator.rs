// src/bidding/validator.rs

use axum::body::{self, Body};
use axum::http::Method;
use tracing::warn;

use crate::error::{BidError, RequiredField};
use crate::openrtb::request::{BidRequest, Device, ValidatedBidRequest};

/// **解析并校验竞价请求**
///
/// 按固定顺序检查，遇到第一个失败立即返回：
/// 请求方法 → 读取 body → JSON 解析 → `id` → `imp` → `imp.id` → `device` → `device.ua`
pub async fn validate(
    method: &Method,
    body: Body,
    max_body_bytes: usize,
) -> Result<ValidatedBidRequest, BidError> {
    let request = decode_body(method, body, max_body_bytes).await?;
    check_required(request)
}

/// 前三步：请求方法、读取 body、JSON 解析，尚未检查必填字段
pub async fn decode_body(
    method: &Method,
    body: Body,
    max_body_bytes: usize,
) -> Result<BidRequest, BidError> {
    if *method != Method::POST {
        warn!(method = %method, "rejecting bid request: invalid request method");
        return Err(BidError::MethodNotAllowed);
    }

    let raw = body::to_bytes(body, max_body_bytes).await.map_err(|e| {
        warn!(error = %e, limit = max_body_bytes, "rejecting bid request: failed to read body");
        BidError::MalformedBody(e.to_string())
    })?;

    decode(&raw)
}

/// 使用 simd-json 将原始字节解析为 `BidRequest`
pub fn decode(raw: &[u8]) -> Result<BidRequest, BidError> {
    // simd-json 需要可写缓冲区，原始 body 不可变，这里拷贝一份
    let mut buf = raw.to_vec();
    simd_json::serde::from_slice::<BidRequest>(&mut buf).map_err(|e| {
        warn!(error = %e, len = raw.len(), "rejecting bid request: invalid JSON");
        BidError::InvalidEncoding(e.to_string())
    })
}

/// 检查业务必填字段，返回带有非空 `Device` 的 `ValidatedBidRequest`
pub fn check_required(request: BidRequest) -> Result<ValidatedBidRequest, BidError> {
    let BidRequest { id, imp, device } = request;

    if id.is_empty() {
        return Err(missing(RequiredField::Id, &id));
    }
    if imp.is_empty() {
        return Err(missing(RequiredField::Imp, &id));
    }
    if imp.iter().any(|i| i.id.is_empty()) {
        return Err(missing(RequiredField::ImpId, &id));
    }
    let device = match device {
        None => return Err(missing(RequiredField::Device, &id)),
        Some(Device { ua }) if ua.is_empty() => {
            return Err(missing(RequiredField::DeviceUa, &id))
        }
        Some(device) => device,
    };

    Ok(ValidatedBidRequest::new(id, imp, device))
}

fn missing(field: RequiredField, request_id: &str) -> BidError {
    warn!(field = %field, request_id, "rejecting bid request: required field missing");
    BidError::MissingField(field)
}
