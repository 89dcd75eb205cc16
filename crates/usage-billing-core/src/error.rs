//! Error types for usage billing.
//!
//! Cost computation itself never fails. These errors cover the fallible edges around it:
//! resolving a reporting window, checking plan lookback, and loading a pricing catalog.

/// Result type for usage billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors that can occur around cost report computation.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// Aggregation interval is not one of the supported values.
    #[error("invalid interval {interval:?}: supported intervals are minute, hour, day")]
    InvalidInterval {
        /// The rejected interval string.
        interval: String,
    },

    /// A timestamp could not be parsed as RFC3339.
    #[error("invalid {field} timestamp {value:?}: use RFC3339, e.g. 2026-02-27T00:00:00Z")]
    InvalidTimestamp {
        /// Which input carried the timestamp (`from`, `to`, ...).
        field: &'static str,
        /// The raw value.
        value: String,
    },

    /// The window start is not strictly before its end.
    #[error("window start {start} must be earlier than end {end}")]
    EmptyWindow {
        /// Requested start (RFC3339).
        start: String,
        /// Requested end (RFC3339).
        end: String,
    },

    /// The requested range reaches further back than the plan allows.
    #[error("requested usage range exceeds your plan lookback ({allowed}): {guidance}")]
    LookbackExceeded {
        /// Tier name of the current plan.
        tier: &'static str,
        /// Human label of the allowed lookback.
        allowed: &'static str,
        /// Requested window start (RFC3339).
        requested_from: String,
        /// Upgrade or support guidance.
        guidance: String,
    },

    /// Configuration error (pricing catalog and friends).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BillingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
