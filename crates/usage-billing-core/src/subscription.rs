//! Subscription snapshots supplied by the account API.
//!
//! The upstream API is inconsistent about key casing, so [`SubscriptionInfo`] accepts
//! both snake_case and camelCase keys and prefers the snake_case value when both are set.

use serde::{Deserialize, Serialize};

/// The caller's subscription plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSubscriptionInfo")]
pub struct SubscriptionInfo {
    /// Plan identifier, the key into the pricing catalog.
    pub id: i64,

    /// Display name of the subscription.
    pub name: String,

    /// Display name of the plan.
    pub plan_name: String,

    /// Requests per second allowed.
    pub rate_limit: i64,

    /// Burst allowance.
    pub burst_limit: i64,

    /// Responses included per billing cycle.
    pub monthly_quota: Option<u64>,

    /// Responses allowed per day, if the plan has a daily cap.
    pub daily_quota: Option<u64>,

    /// Maximum number of API keys.
    pub api_keys_limit: i64,
}

impl SubscriptionInfo {
    /// Create a subscription for a plan id with everything else unset.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Set the plan name.
    #[must_use]
    pub fn with_plan_name(mut self, plan_name: impl Into<String>) -> Self {
        self.plan_name = plan_name.into();
        self
    }

    /// Set the monthly quota.
    #[must_use]
    pub fn with_monthly_quota(mut self, quota: u64) -> Self {
        self.monthly_quota = Some(quota);
        self
    }

    /// Plan name for display: `plan_name`, then `name`, then `"Unknown"`.
    #[must_use]
    pub fn effective_plan_name(&self) -> &str {
        if !self.plan_name.is_empty() {
            &self.plan_name
        } else if !self.name.is_empty() {
            &self.name
        } else {
            "Unknown"
        }
    }

    /// Monthly quota, treating an absent quota as zero.
    #[must_use]
    pub fn monthly_quota_or_zero(&self) -> u64 {
        self.monthly_quota.unwrap_or(0)
    }
}

#[derive(Deserialize)]
struct RawSubscriptionInfo {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    plan_name: Option<String>,
    #[serde(default, rename = "planName")]
    plan_name_camel: Option<String>,
    #[serde(default)]
    rate_limit: Option<i64>,
    #[serde(default, rename = "rateLimit")]
    rate_limit_camel: Option<i64>,
    #[serde(default)]
    burst_limit: Option<i64>,
    #[serde(default, rename = "burstLimit")]
    burst_limit_camel: Option<i64>,
    #[serde(default)]
    monthly_quota: Option<u64>,
    #[serde(default, rename = "monthlyQuota")]
    monthly_quota_camel: Option<u64>,
    #[serde(default)]
    daily_quota: Option<u64>,
    #[serde(default, rename = "dailyQuota")]
    daily_quota_camel: Option<u64>,
    #[serde(default)]
    api_keys_limit: Option<i64>,
    #[serde(default, rename = "apiKeysLimit")]
    api_keys_limit_camel: Option<i64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn non_zero(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

impl From<RawSubscriptionInfo> for SubscriptionInfo {
    fn from(raw: RawSubscriptionInfo) -> Self {
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            plan_name: non_empty(raw.plan_name)
                .or(raw.plan_name_camel)
                .unwrap_or_default(),
            rate_limit: non_zero(raw.rate_limit)
                .or(raw.rate_limit_camel)
                .unwrap_or(0),
            burst_limit: non_zero(raw.burst_limit)
                .or(raw.burst_limit_camel)
                .unwrap_or(0),
            monthly_quota: raw.monthly_quota.or(raw.monthly_quota_camel),
            daily_quota: raw.daily_quota.or(raw.daily_quota_camel),
            api_keys_limit: non_zero(raw.api_keys_limit)
                .or(raw.api_keys_limit_camel)
                .unwrap_or(0),
        }
    }
}

/// Current subscription window as reported upstream: raw date strings, either may be
/// missing. Parse into a [`crate::BillingAnchor`] before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWindow {
    /// Subscription start date (RFC3339 or `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Next renewal date (RFC3339 or `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<String>,
}
