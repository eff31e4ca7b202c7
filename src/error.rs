use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt;
use thiserror::Error;

/// 业务必填字段，`Display` 输出线上路径（如 `device.ua`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Id,
    Imp,
    ImpId,
    Device,
    DeviceUa,
}

impl RequiredField {
    pub fn path(self) -> &'static str {
        match self {
            RequiredField::Id => "id",
            RequiredField::Imp => "imp",
            RequiredField::ImpId => "imp.id",
            RequiredField::Device => "device",
            RequiredField::DeviceUa => "device.ua",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// 竞价请求处理过程中的所有错误
#[derive(Debug, Error, PartialEq)]
pub enum BidError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("failed to read request body: {0}")]
    MalformedBody(String),
    #[error("invalid JSON payload: {0}")]
    InvalidEncoding(String),
    #[error("missing required field `{0}`")]
    MissingField(RequiredField),
    #[error("failed to encode bid response: {0}")]
    EncodingFailure(String),
}

impl BidError {
    pub fn status(&self) -> StatusCode {
        match self {
            BidError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            BidError::MalformedBody(_)
            | BidError::InvalidEncoding(_)
            | BidError::MissingField(_) => StatusCode::BAD_REQUEST,
            BidError::EncodingFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给调用方的简短原因，不包含内部细节
    pub fn reason(&self) -> &'static str {
        match self {
            BidError::MethodNotAllowed => "Method not allowed",
            BidError::MalformedBody(_) => "Bad request",
            BidError::InvalidEncoding(_) => "Invalid JSON",
            BidError::MissingField(field) => match field {
                RequiredField::Id => "Request ID is required",
                RequiredField::Imp => "At least one impression is required",
                RequiredField::ImpId => "Impression ID is required",
                RequiredField::Device => "Device object is required",
                RequiredField::DeviceUa => "Device UserAgent is required",
            },
            BidError::EncodingFailure(_) => "Internal server error",
        }
    }

    pub fn is_server_fault(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for BidError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.reason(),
        )
            .into_response()
    }
}
