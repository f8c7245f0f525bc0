use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum SnaplinkError {
    NotFound(String),
    Expired(String),
    Conflict(String),
    InvalidFormat(String),
    InvalidUrl(String),
    RateLimited { message: String, retry_after: u64 },
    StoreUnavailable(String),
    KeyspaceExhausted(String),
    DatabaseConfig(String),
    Config(String),
    Serialization(String),
    FileOperation(String),
}

impl SnaplinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SnaplinkError::NotFound(_) => "E001",
            SnaplinkError::Expired(_) => "E002",
            SnaplinkError::Conflict(_) => "E003",
            SnaplinkError::InvalidFormat(_) => "E004",
            SnaplinkError::InvalidUrl(_) => "E005",
            SnaplinkError::RateLimited { .. } => "E006",
            SnaplinkError::StoreUnavailable(_) => "E007",
            SnaplinkError::KeyspaceExhausted(_) => "E008",
            SnaplinkError::DatabaseConfig(_) => "E009",
            SnaplinkError::Config(_) => "E010",
            SnaplinkError::Serialization(_) => "E011",
            SnaplinkError::FileOperation(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            SnaplinkError::NotFound(_) => "Resource Not Found",
            SnaplinkError::Expired(_) => "Link Expired",
            SnaplinkError::Conflict(_) => "Short Code Conflict",
            SnaplinkError::InvalidFormat(_) => "Invalid Format",
            SnaplinkError::InvalidUrl(_) => "Invalid URL",
            SnaplinkError::RateLimited { .. } => "Rate Limited",
            SnaplinkError::StoreUnavailable(_) => "Store Unavailable",
            SnaplinkError::KeyspaceExhausted(_) => "Keyspace Exhausted",
            SnaplinkError::DatabaseConfig(_) => "Database Configuration Error",
            SnaplinkError::Config(_) => "Configuration Error",
            SnaplinkError::Serialization(_) => "Serialization Error",
            SnaplinkError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            SnaplinkError::NotFound(msg) => msg,
            SnaplinkError::Expired(msg) => msg,
            SnaplinkError::Conflict(msg) => msg,
            SnaplinkError::InvalidFormat(msg) => msg,
            SnaplinkError::InvalidUrl(msg) => msg,
            SnaplinkError::RateLimited { message, .. } => message,
            SnaplinkError::StoreUnavailable(msg) => msg,
            SnaplinkError::KeyspaceExhausted(msg) => msg,
            SnaplinkError::DatabaseConfig(msg) => msg,
            SnaplinkError::Config(msg) => msg,
            SnaplinkError::Serialization(msg) => msg,
            SnaplinkError::FileOperation(msg) => msg,
        }
    }

    /// HTTP status the API layer reports for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            SnaplinkError::NotFound(_) => StatusCode::NOT_FOUND,
            SnaplinkError::Expired(_) => StatusCode::GONE,
            SnaplinkError::Conflict(_) => StatusCode::CONFLICT,
            SnaplinkError::InvalidFormat(_) | SnaplinkError::InvalidUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            SnaplinkError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            SnaplinkError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SnaplinkError::KeyspaceExhausted(_)
            | SnaplinkError::DatabaseConfig(_)
            | SnaplinkError::Config(_)
            | SnaplinkError::Serialization(_)
            | SnaplinkError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SnaplinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SnaplinkError {}

// 便捷的构造函数
impl SnaplinkError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::NotFound(msg.into())
    }

    pub fn expired<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Expired(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Conflict(msg.into())
    }

    pub fn invalid_format<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::InvalidFormat(msg.into())
    }

    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::InvalidUrl(msg.into())
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        SnaplinkError::RateLimited {
            message: format!("Rate limit exceeded, retry after {}s", retry_after),
            retry_after,
        }
    }

    pub fn store_unavailable<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::StoreUnavailable(msg.into())
    }

    pub fn keyspace_exhausted<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::KeyspaceExhausted(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DatabaseConfig(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Config(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for SnaplinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        SnaplinkError::StoreUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for SnaplinkError {
    fn from(err: std::io::Error) -> Self {
        SnaplinkError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for SnaplinkError {
    fn from(err: serde_json::Error) -> Self {
        SnaplinkError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for SnaplinkError {
    fn from(err: config::ConfigError) -> Self {
        SnaplinkError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnaplinkError>;
