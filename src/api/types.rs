//! HTTP DTOs and the response envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::SnaplinkError;

/// Envelope for every JSON response except the 429 body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Numeric API codes, grouped by thousands:
/// - 0: success
/// - 1000-1099: generic
/// - 2000-2099: throttling
/// - 3000-3099: links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    RateLimitExceeded = 2004,

    LinkNotFound = 3000,
    LinkAlreadyExists = 3001,
    LinkInvalidUrl = 3002,
    LinkInvalidFormat = 3003,
    LinkExpired = 3007,
    LinkKeyspaceExhausted = 3008,
}

impl From<&SnaplinkError> for ErrorCode {
    fn from(err: &SnaplinkError) -> Self {
        match err {
            SnaplinkError::NotFound(_) => ErrorCode::LinkNotFound,
            SnaplinkError::Expired(_) => ErrorCode::LinkExpired,
            SnaplinkError::Conflict(_) => ErrorCode::LinkAlreadyExists,
            SnaplinkError::InvalidUrl(_) => ErrorCode::LinkInvalidUrl,
            SnaplinkError::InvalidFormat(_) => ErrorCode::LinkInvalidFormat,
            SnaplinkError::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            SnaplinkError::StoreUnavailable(_) => ErrorCode::ServiceUnavailable,
            SnaplinkError::KeyspaceExhausted(_) => ErrorCode::LinkKeyspaceExhausted,
            SnaplinkError::DatabaseConfig(_)
            | SnaplinkError::Config(_)
            | SnaplinkError::Serialization(_)
            | SnaplinkError::FileOperation(_) => ErrorCode::InternalServerError,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl MessageResponse {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Body of a 429 response
#[derive(Debug, Serialize, Deserialize)]
pub struct RateLimitedBody {
    pub detail: String,
    pub retry_after: u64,
}
