//! Usage-based billing cost engine.
//!
//! Given a plan, a billing-cycle anchor, a reporting interval, and raw usage rows, this
//! crate estimates what the usage costs:
//!
//! - **Pricing**: `PlanPricingCatalog`, `PlanPricing`
//! - **Cycles**: `BillingAnchor`, `BillingWindow`, `resolve_window`
//! - **Segments**: `BillingSegment`, `split_interval`
//! - **Cost**: `calculate_segment_cost`, `CostType`, `DiscountInfo`
//! - **Reports**: `build_report`, `CostQuery`, `CostReport`
//! - **Windows**: `resolve_usage_window`, `validate_lookback`
//!
//! # Cost model
//!
//! Each billing cycle includes `monthly_quota` responses. Included responses cost the
//! plan's base fee prorated by whole days, but at least $2.00 per million; responses past
//! the quota cost the plan's overage rate per million. Quota consumption is counted over
//! organization-wide usage, and a filtered view receives its proportional share.
//!
//! Everything here is synchronous and allocation-local: a report is a pure function of
//! its inputs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cost;
pub mod cycle;
pub mod discount;
pub mod error;
pub mod pricing;
pub mod report;
pub mod segment;
pub mod subscription;
pub mod usage;
pub mod window;

pub use cost::{calculate_segment_cost, days_in_range, CostType, SegmentCost};
pub use cycle::{
    calendar_month, first_of_month_utc, parse_subscription_date, resolve_window, BillingAnchor,
    BillingWindow,
};
pub use discount::{DiscountInfo, DiscountKind, DiscountMeta};
pub use error::{BillingError, Result};
pub use pricing::{
    plan_allows_overages, plan_pricing, PlanEntry, PlanPricing, PlanPricingCatalog, BUILTIN_PLANS,
    DEFAULT_PLAN_PRICING, EFFECTIVE_INCLUDED_RATE_PER_MILLION,
};
pub use report::{
    build_report, format_instant, CostByGroup, CostQuery, CostReport, CostSegmentBreakdown,
    UNKNOWN_DOMAIN, UNSUPPORTED_PLAN_HINT,
};
pub use segment::{earliest_billing_period_start, split_interval, BillingSegment, MAX_SEGMENTS};
pub use subscription::{SubscriptionInfo, SubscriptionWindow};
pub use usage::{UsageFilters, UsageRow};
pub use window::{
    plan_lookback, required_tier_for_lookback, resolve_usage_window, validate_lookback,
    PlanLookback, UsageInterval, UsageWindow,
};
