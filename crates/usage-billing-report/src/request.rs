//! Cost requests: everything the engine needs, gathered by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use usage_billing_core::{
    build_report, earliest_billing_period_start, format_instant, resolve_usage_window,
    validate_lookback, BillingAnchor, CostQuery, CostReport, DiscountInfo, PlanPricingCatalog,
    SubscriptionInfo, SubscriptionWindow, UsageFilters, UsageRow, UsageWindow,
};

use crate::error::ReportError;

fn default_interval() -> String {
    "hour".to_string()
}

/// A cost request.
///
/// `filtered` holds the usage rows the report is about. When `filters` narrow that
/// usage, `basis` must hold the organization-wide rows from the start of the earliest
/// billing cycle touched by the window, so quota consumption is counted correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRequest {
    /// Subscription plan details.
    pub subscription: SubscriptionInfo,

    /// Active discount, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountInfo>,

    /// Upstream subscription dates anchoring the billing cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_subscription: Option<SubscriptionWindow>,

    /// Aggregation interval: `minute`, `hour`, or `day`.
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Window start (RFC3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Window end (RFC3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Evaluation time; the wall clock when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<DateTime<Utc>>,

    /// Filters applied when fetching `filtered`.
    #[serde(default)]
    pub filters: UsageFilters,

    /// Usage rows to cost.
    #[serde(default)]
    pub filtered: Vec<UsageRow>,

    /// Unfiltered usage rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<Vec<UsageRow>>,
}

impl CostRequest {
    /// Parse a request from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json_str(input: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Resolve the reporting window and, when `enforce_lookback` is set, check it against
    /// the plan's lookback.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed window or one reaching past the plan's lookback.
    pub fn usage_window(
        &self,
        now: DateTime<Utc>,
        enforce_lookback: bool,
    ) -> Result<UsageWindow, ReportError> {
        let window = resolve_usage_window(
            &self.interval,
            self.from.as_deref(),
            self.to.as_deref(),
            now,
        )?;

        if window.used_defaults {
            tracing::info!(
                window = window.default_label.unwrap_or("custom"),
                start = %window.formatted_start(),
                end = %window.formatted_end(),
                "Using default usage window"
            );
        }

        if enforce_lookback {
            validate_lookback(self.subscription.id, &window, now)?;
        }
        Ok(window)
    }

    /// Billing-cycle anchor from the upstream subscription dates.
    #[must_use]
    pub fn anchor(&self) -> BillingAnchor {
        BillingAnchor::from_window(self.current_subscription.as_ref())
    }

    /// Build the cost report.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid window, an exceeded lookback, or filtered usage
    /// without basis rows.
    pub fn evaluate(
        &self,
        catalog: &PlanPricingCatalog,
        now: DateTime<Utc>,
        enforce_lookback: bool,
    ) -> Result<CostReport, ReportError> {
        let now = self.now.unwrap_or(now);
        let window = self.usage_window(now, enforce_lookback)?;
        let anchor = self.anchor();

        let basis = match &self.basis {
            Some(rows) => rows.as_slice(),
            None if self.filters.is_empty() => self.filtered.as_slice(),
            None => {
                let from = earliest_billing_period_start(window.start, window.end, &anchor);
                return Err(ReportError::MissingBasis {
                    basis_from: format_instant(from),
                });
            }
        };

        let query = CostQuery {
            plan: &self.subscription,
            monthly_quota: self.subscription.monthly_quota_or_zero(),
            discount: self.discount.as_ref(),
            anchor,
            interval_start: window.start,
            interval_end: window.end,
            filtered: &self.filtered,
            basis,
        };
        let report = build_report(catalog, &query);

        tracing::info!(
            plan_id = report.plan_id,
            segments = report.segments.len(),
            total_responses = report.total_responses,
            total_cost = report.total_cost,
            "Built cost report"
        );
        Ok(report)
    }
}

/// Serialize a report as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_report(report: &CostReport, pretty: bool) -> Result<String, ReportError> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 27, 12, 0, 0).unwrap()
    }

    #[test]
    fn minimal_request_defaults() {
        let request = CostRequest::from_json_str(r#"{"subscription": {"id": 2}}"#).unwrap();
        assert_eq!(request.interval, "hour");
        assert!(request.filters.is_empty());
        assert!(request.filtered.is_empty());
        assert!(request.basis.is_none());
    }

    #[test]
    fn anchor_from_subscription_dates() {
        let request = CostRequest::from_json_str(
            r#"{"subscription": {"id": 2}, "current_subscription": {"renewalDate": "2026-03-15"}}"#,
        )
        .unwrap();
        let anchor = request.anchor();
        assert_eq!(
            anchor.renewal_date,
            Some(Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(anchor.start_date, None);
    }

    #[test]
    fn lookback_can_be_disabled() {
        let request = CostRequest::from_json_str(
            r#"{"subscription": {"id": 1}, "from": "2026-01-01T00:00:00Z", "to": "2026-01-02T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(request.usage_window(now(), true).is_err());
        assert!(request.usage_window(now(), false).is_ok());
    }

    #[test]
    fn filters_without_basis_are_rejected() {
        let request = CostRequest::from_json_str(
            r#"{
                "subscription": {"id": 2},
                "from": "2026-02-25T00:00:00Z",
                "to": "2026-02-26T00:00:00Z",
                "filters": {"fqdn": "eth.example.com"}
            }"#,
        )
        .unwrap();
        let err = request
            .evaluate(&PlanPricingCatalog::default(), now(), true)
            .unwrap_err();
        match err {
            ReportError::MissingBasis { basis_from } => {
                assert_eq!(basis_from, "2026-02-01T00:00:00Z");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn request_now_overrides_clock() {
        let request = CostRequest::from_json_str(
            r#"{"subscription": {"id": 2}, "now": "2026-02-27T12:00:00Z", "interval": "day"}"#,
        )
        .unwrap();
        let report = request
            .evaluate(
                &PlanPricingCatalog::default(),
                Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
                false,
            )
            .unwrap();
        assert_eq!(report.interval_end, "2026-02-27T12:00:00Z");
        assert_eq!(report.interval_start, "2026-01-28T12:00:00Z");
    }

    #[test]
    fn render_compact_and_pretty() {
        let request = CostRequest::from_json_str(
            r#"{"subscription": {"id": 2}, "from": "2026-02-26T00:00:00Z", "to": "2026-02-27T00:00:00Z"}"#,
        )
        .unwrap();
        let report = request
            .evaluate(&PlanPricingCatalog::default(), now(), true)
            .unwrap();
        let compact = render_report(&report, false).unwrap();
        let pretty = render_report(&report, true).unwrap();
        assert!(!compact.contains('\n'));
        assert!(pretty.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&compact).unwrap(),
            serde_json::from_str::<serde_json::Value>(&pretty).unwrap()
        );
    }
}
