//! Response builders shared by the route handlers

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::RETRY_AFTER;
use serde::Serialize;
use tracing::error;

use crate::errors::SnaplinkError;

use super::types::{ApiResponse, ErrorCode, RateLimitedBody};

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

pub fn rate_limited_response(retry_after: u64) -> HttpResponse {
    HttpResponse::TooManyRequests()
        .insert_header((RETRY_AFTER, retry_after.to_string()))
        .json(RateLimitedBody {
            detail: "Rate limit exceeded".to_string(),
            retry_after,
        })
}

/// Maps a `SnaplinkError` to its status and `ErrorCode`.
///
/// Server-side failures are logged here; their details stay out of the body.
pub fn error_from_snaplink(err: &SnaplinkError) -> HttpResponse {
    if let SnaplinkError::RateLimited { retry_after, .. } = err {
        return rate_limited_response(*retry_after);
    }

    let status = err.http_status();
    if status.is_server_error() {
        error!("{}", err.format_simple());
        let message = match err {
            SnaplinkError::StoreUnavailable(_) => "Storage temporarily unavailable",
            SnaplinkError::KeyspaceExhausted(_) => "Could not allocate a short code",
            _ => "Internal server error",
        };
        return error_response(status, ErrorCode::from(err), message);
    }

    error_response(status, ErrorCode::from(err), err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: crate::errors::Result<T>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_snaplink(&e),
    }
}
