//! Retry policy for database statements
//!
//! Transient failures (pool exhaustion, dropped connections, deadlocks,
//! SQLite BUSY/LOCKED) and per-attempt timeouts are retried with capped
//! exponential backoff plus jitter. Everything else returns immediately.

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// 判断数据库错误是否可重试
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => {
            is_retryable_runtime_error(runtime_err)
        }
        _ => false,
    }
}

fn is_retryable_runtime_error(err: &sea_orm::error::RuntimeErr) -> bool {
    use sea_orm::error::RuntimeErr;

    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(code) = sqlx_err
                .deref()
                .as_database_error()
                .and_then(|db_err| db_err.code())
            {
                // MySQL 死锁/锁超时, PostgreSQL 序列化失败/死锁, SQLite BUSY/LOCKED
                return matches!(
                    code.as_ref(),
                    "1213" | "1205" | "40001" | "40P01" | "5" | "6"
                );
            }
            is_retryable_message(&sqlx_err.to_string())
        }
        RuntimeErr::Internal(msg) => is_retryable_message(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn is_retryable_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    ["deadlock", "lock wait timeout", "database is locked", "serialization failure"]
        .iter()
        .any(|needle| msg.contains(needle))
}

/// Backoff before retry number `attempt` (1-based), plus 0-25% jitter
fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp.min(max_ms);
    let jitter = rand::random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}

/// Runs `operation` with a per-attempt timeout, retrying transient
/// failures. A final timeout is reported as `DbErr::Custom`.
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    timeout_ms: u64,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        let failure = match timeout(Duration::from_millis(timeout_ms), operation()).await {
            Ok(Ok(value)) => {
                if attempt > 0 {
                    debug!("'{}' succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Ok(Err(e)) if is_retryable_error(&e) => e,
            Ok(Err(e)) => {
                debug!("'{}' failed with non-retryable error: {}", operation_name, e);
                return Err(e);
            }
            Err(_elapsed) => DbErr::Custom(format!(
                "Operation '{}' timed out after {}ms",
                operation_name, timeout_ms
            )),
        };

        if attempt >= config.max_retries {
            warn!(
                "'{}' failed after {} attempts: {}",
                operation_name,
                attempt + 1,
                failure
            );
            return Err(failure);
        }

        attempt += 1;
        let delay = backoff_delay(attempt, config.base_delay_ms, config.max_delay_ms);
        warn!(
            "'{}' failed (attempt {}/{}): {}; retrying in {} ms",
            operation_name,
            attempt,
            config.max_retries + 1,
            failure,
            delay
        );
        sleep(Duration::from_millis(delay)).await;
    }
}
