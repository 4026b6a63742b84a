//! Error types for the food lookup client
//!
//! Provides unified error handling using thiserror. Every variant is produced
//! where the failure happens and carries structured data, so callers classify
//! errors through [`FoodError::kind`] instead of matching on messages.

use thiserror::Error;

// == Error Kind ==
/// Stable classification of a failure, for boundary layers that map errors
/// onto transport-level status signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Every attempt exceeded the per-attempt deadline
    Timeout,
    /// Upstream kept answering 429
    RateLimited,
    /// Upstream kept answering with a 5xx status
    UpstreamUnavailable,
    /// Upstream has no such product
    NotFound,
    /// Anything else
    Upstream,
}

// == Food Error Enum ==
/// Unified error type for the food lookup client.
#[derive(Error, Debug)]
pub enum FoodError {
    /// Upstream never answered within the deadline
    #[error("Request timeout - upstream took longer than {timeout_ms}ms to respond")]
    Timeout { timeout_ms: u64 },

    /// Rate limit still in effect after retries
    #[error("Rate limit exceeded after {attempts} attempts. Please try again later.")]
    RateLimited { attempts: u32 },

    /// Upstream server errors after retries
    #[error("Food database unavailable (status {status} after {attempts} attempts)")]
    UpstreamUnavailable { status: u16, attempts: u32 },

    /// Product detail payload had no product body
    #[error("Product not found: {food_id}")]
    NotFound { food_id: String },

    /// Non-success status that is not retried
    #[error("API Error: {status} {status_text}")]
    Upstream { status: u16, status_text: String },

    /// Connection-level failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// Upstream body could not be decoded
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    /// Client could not be constructed from configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FoodError {
    // == Kind ==
    /// Returns the stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FoodError::Timeout { .. } => ErrorKind::Timeout,
            FoodError::RateLimited { .. } => ErrorKind::RateLimited,
            FoodError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            FoodError::NotFound { .. } => ErrorKind::NotFound,
            FoodError::Upstream { .. }
            | FoodError::Network { .. }
            | FoodError::Decode(_)
            | FoodError::InvalidConfig(_) => ErrorKind::Upstream,
        }
    }

    /// HTTP status reported by upstream, when the failure came from one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            FoodError::RateLimited { .. } => Some(429),
            FoodError::UpstreamUnavailable { status, .. } | FoodError::Upstream { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FoodError {
    fn from(err: serde_json::Error) -> Self {
        FoodError::Decode(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the food lookup client.
pub type Result<T> = std::result::Result<T, FoodError>;
