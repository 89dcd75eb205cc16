//! Report tool errors and their JSON envelope.

use serde::Serialize;
use usage_billing_core::BillingError;

/// Errors that can stop a report from being produced.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Window, lookback, or catalog problem from the engine.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Reading the request failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request or report could not be (de)serialized.
    #[error("invalid request: {0}")]
    Json(#[from] serde_json::Error),

    /// Filters were applied but no organization-wide basis rows were supplied.
    #[error("filtered usage needs unfiltered basis rows starting at {basis_from}")]
    MissingBasis {
        /// Where the basis rows must start (RFC3339).
        basis_from: String,
    },
}

impl ReportError {
    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Billing(BillingError::LookbackExceeded { .. }) => "lookback_exceeded",
            Self::Billing(BillingError::Configuration(_)) => "configuration_error",
            Self::Billing(_) | Self::Json(_) | Self::MissingBasis { .. } => "validation_error",
            Self::Io(_) => "io_error",
        }
    }

    /// Hint for the caller, where one helps.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Billing(BillingError::LookbackExceeded { guidance, .. }) => {
                Some(guidance.clone())
            }
            Self::Billing(BillingError::InvalidInterval { .. }) => {
                Some("Supported intervals: minute, hour, day".into())
            }
            Self::Billing(BillingError::InvalidTimestamp { .. }) => {
                Some("Use RFC3339 format, e.g. 2026-02-27T00:00:00Z".into())
            }
            Self::MissingBasis { basis_from } => Some(format!(
                "Supply `basis` with unfiltered usage from {basis_from} to the window end"
            )),
            _ => None,
        }
    }

    /// JSON body written in place of a report.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
                hint: self.hint(),
            },
        }
    }
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorBody,
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error code.
    pub code: &'static str,
    /// Error message.
    pub message: String,
    /// Optional hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
