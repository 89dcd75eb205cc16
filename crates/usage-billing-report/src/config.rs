//! Report tool configuration.

use std::path::{Path, PathBuf};

use usage_billing_core::PlanPricingCatalog;

use crate::error::ReportError;

/// Places searched for a pricing catalog when `PRICING_CATALOG_PATH` is unset.
const CATALOG_SEARCH_PATHS: [&str; 3] = [
    ".config/pricing.json",
    "usage-billing/.config/pricing.json",
    "../.config/pricing.json",
];

/// Configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Cost request file (`COST_REQUEST_PATH`); stdin when unset.
    pub request_path: Option<PathBuf>,

    /// Pricing catalog file (`PRICING_CATALOG_PATH`).
    pub pricing_catalog_path: Option<PathBuf>,

    /// Reject windows reaching past the plan's lookback (`ENFORCE_LOOKBACK`, default true).
    pub enforce_lookback: bool,

    /// Pretty-print the report (`REPORT_PRETTY`, default false).
    pub pretty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            request_path: None,
            pricing_catalog_path: None,
            enforce_lookback: true,
            pretty: false,
        }
    }
}

impl ReportConfig {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(default)
        };

        Self {
            request_path: path("COST_REQUEST_PATH"),
            pricing_catalog_path: path("PRICING_CATALOG_PATH"),
            enforce_lookback: flag("ENFORCE_LOOKBACK", true),
            pretty: flag("REPORT_PRETTY", false),
        }
    }

    /// Load the pricing catalog.
    ///
    /// An explicit `pricing_catalog_path` must load. Otherwise the search paths are tried
    /// in order and the built-in table is used when none of them holds a valid catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicitly configured catalog cannot be loaded.
    pub fn load_pricing_catalog(&self) -> Result<PlanPricingCatalog, ReportError> {
        if let Some(path) = &self.pricing_catalog_path {
            let catalog = PlanPricingCatalog::from_path(path)?;
            tracing::info!(path = %path.display(), "Using configured pricing catalog");
            return Ok(catalog);
        }

        for path in CATALOG_SEARCH_PATHS {
            let path = Path::new(path);
            if !path.exists() {
                continue;
            }
            match PlanPricingCatalog::from_path(path) {
                Ok(catalog) => {
                    tracing::info!(path = %path.display(), "Loaded pricing catalog from file");
                    return Ok(catalog);
                }
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "Ignoring invalid pricing catalog"
                    );
                }
            }
        }

        tracing::debug!("Pricing catalog file not found, using built-in table");
        Ok(PlanPricingCatalog::default())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
