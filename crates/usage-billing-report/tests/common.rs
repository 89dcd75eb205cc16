//! Common test utilities for cost report integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

use usage_billing_report::{generate, ReportConfig, ReportError};

/// Test harness with a scratch directory for request and catalog files.
pub struct TestHarness {
    /// Temporary directory (kept alive for test duration).
    pub temp_dir: TempDir,
    /// Configuration used for every run.
    pub config: ReportConfig,
}

impl TestHarness {
    /// Harness using the built-in pricing table.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = ReportConfig {
            pricing_catalog_path: None,
            ..ReportConfig::default()
        };
        Self { temp_dir, config }
    }

    /// Harness reading pricing from a catalog file with the given JSON content.
    pub fn with_catalog(catalog: &Value) -> Self {
        let mut harness = Self::new();
        let path = harness.temp_dir.path().join("pricing.json");
        std::fs::write(&path, catalog.to_string()).expect("Failed to write catalog");
        harness.config.pricing_catalog_path = Some(path);
        harness
    }

    /// Run a request and return the parsed report.
    pub fn report(&self, request: &Value) -> Value {
        let output = self.run(request).expect("Report failed");
        serde_json::from_str(&output).expect("Report is not JSON")
    }

    /// Run a request and return the raw result.
    pub fn run(&self, request: &Value) -> Result<String, ReportError> {
        generate(&self.config, &request.to_string(), fallback_now())
    }
}

/// Clock used when a request carries no `now`.
pub fn fallback_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap()
}

/// A usage row.
pub fn row(timestamp: &str, domain: &str, responses: u64) -> Value {
    json!({
        "timestamp": timestamp,
        "domain": domain,
        "requests": responses,
        "responses": responses,
    })
}

/// A Developer plan subscription with a 25M monthly quota.
pub fn developer_subscription() -> Value {
    json!({
        "id": 2,
        "name": "Developer",
        "planName": "Developer",
        "monthlyQuota": 25_000_000,
    })
}

/// Compare money values.
pub fn approx(actual: &Value, expected: f64) -> bool {
    actual
        .as_f64()
        .is_some_and(|v| (v - expected).abs() < 1e-9)
}
