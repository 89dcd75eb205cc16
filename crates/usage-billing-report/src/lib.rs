//! Cost report tool.
//!
//! Reads a JSON [`CostRequest`] (subscription, discount, cycle dates, window, and usage
//! rows), runs it through the billing engine, and writes the resulting cost report as
//! JSON. Failures are written as an [`ErrorResponse`] envelope.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod request;

use std::io::Read;

use chrono::{DateTime, Utc};

pub use config::ReportConfig;
pub use error::{ErrorBody, ErrorResponse, ReportError};
pub use request::{render_report, CostRequest};

/// Read the raw request from the configured file, or stdin.
///
/// # Errors
///
/// Returns an error if the input cannot be read.
pub fn read_request(config: &ReportConfig) -> Result<String, ReportError> {
    if let Some(path) = &config.request_path {
        tracing::debug!(path = %path.display(), "Reading cost request");
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

/// Produce the report JSON for a raw request.
///
/// # Errors
///
/// Returns an error if the catalog, request, or window is invalid.
pub fn generate(
    config: &ReportConfig,
    input: &str,
    now: DateTime<Utc>,
) -> Result<String, ReportError> {
    let catalog = config.load_pricing_catalog()?;
    let request = CostRequest::from_json_str(input)?;
    let report = request.evaluate(&catalog, now, config.enforce_lookback)?;
    render_report(&report, config.pretty)
}
