//! Short-code generation and custom-code validation

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{Result, SnaplinkError};
use crate::storage::UrlStore;
use crate::utils::generate_random_code;

/// Custom codes that would shadow a route, compared case-insensitively
pub const RESERVED_CODES: &[&str] = &[
    "api",
    "health",
    "shorten",
    "info",
    "analytics",
    "cache",
    "qrcode",
];

pub const CUSTOM_CODE_MIN_LEN: usize = 3;
pub const CUSTOM_CODE_MAX_LEN: usize = 20;

pub struct CodeGenerator {
    store: Arc<dyn UrlStore>,
    code_length: usize,
    max_attempts: usize,
}

impl CodeGenerator {
    /// `code_length` and `max_attempts` of 0 are treated as 1.
    pub fn new(store: Arc<dyn UrlStore>, code_length: usize, max_attempts: usize) -> Self {
        Self {
            store,
            code_length: code_length.max(1),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Draws random codes until one is unknown to the store.
    ///
    /// Fails with `KeyspaceExhausted` after `max_attempts` collisions in a
    /// row; store errors are returned as-is.
    pub async fn generate_unique(&self) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = generate_random_code(self.code_length);
            if !self.store.code_exists(&candidate).await? {
                if attempt > 1 {
                    debug!("Generated code after {} attempts", attempt);
                }
                return Ok(candidate);
            }
        }

        warn!(
            "No free {}-character code after {} attempts",
            self.code_length, self.max_attempts
        );
        Err(SnaplinkError::keyspace_exhausted(format!(
            "No free {}-character code found after {} attempts",
            self.code_length, self.max_attempts
        )))
    }

    /// Format check for client-chosen codes. Availability is checked by
    /// the caller against the store.
    pub fn validate_custom(code: &str) -> Result<()> {
        let len = code.chars().count();
        if !(CUSTOM_CODE_MIN_LEN..=CUSTOM_CODE_MAX_LEN).contains(&len) {
            return Err(SnaplinkError::invalid_format(format!(
                "Custom code must be {}-{} characters long",
                CUSTOM_CODE_MIN_LEN, CUSTOM_CODE_MAX_LEN
            )));
        }

        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SnaplinkError::invalid_format(
                "Custom code must be alphanumeric",
            ));
        }

        let lowered = code.to_ascii_lowercase();
        if RESERVED_CODES.contains(&lowered.as_str()) {
            return Err(SnaplinkError::invalid_format(format!(
                "Custom code '{}' is reserved",
                code
            )));
        }

        Ok(())
    }
}
