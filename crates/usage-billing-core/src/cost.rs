//! Cost of the usage inside one billing segment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::discount::DiscountInfo;
use crate::pricing::{PlanPricing, EFFECTIVE_INCLUDED_RATE_PER_MILLION};
use crate::segment::BillingSegment;

const RESPONSES_PER_MILLION: f64 = 1_000_000.0;

/// Which quota portions a segment's usage fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostType {
    /// All usage within the monthly quota.
    Included,
    /// All usage beyond the monthly quota.
    Overage,
    /// Usage crossed the quota inside the segment.
    IncludedAndOverage,
}

/// Cost of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCost {
    /// Dollars after discount.
    pub amount: f64,
    /// Quota portions present.
    pub cost_type: CostType,
    /// Human-readable calculation, e.g. `"1 days × ($49.00 ÷ 28) = $2.00"`.
    pub calculation: String,
}

impl SegmentCost {
    fn free() -> Self {
        Self {
            amount: 0.0,
            cost_type: CostType::Included,
            calculation: "No responses".to_string(),
        }
    }
}

/// Whole days between two instants, truncated, at least one.
#[must_use]
pub fn days_in_range(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days().max(1)
}

/// Price `responses` served during `segment`.
///
/// `included_quota` is the plan's monthly quota and `segment.cumulative_usage_at_start`
/// the organization's usage earlier in the same cycle; together they decide how much of
/// `responses` is included and how much is overage. Included usage costs the prorated
/// base fee, but never less than [`EFFECTIVE_INCLUDED_RATE_PER_MILLION`]; overage costs
/// the plan's per-million rate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_segment_cost(
    responses: u64,
    segment: &BillingSegment,
    pricing: &PlanPricing,
    included_quota: u64,
    discount: Option<&DiscountInfo>,
) -> SegmentCost {
    if responses == 0 {
        return SegmentCost::free();
    }

    let days_in_period = days_in_range(segment.billing_period_start, segment.billing_period_end);
    let days_in_segment = days_in_range(segment.start, segment.end);

    let used_before = segment.cumulative_usage_at_start;
    let cumulative_at_end = used_before.saturating_add(responses);
    let included_at_start = included_quota.saturating_sub(used_before);

    let (included, overage) = if used_before >= included_quota {
        (0, responses)
    } else if cumulative_at_end <= included_quota {
        (responses, 0)
    } else {
        (included_at_start, responses - included_at_start)
    };

    let mut included_cost = 0.0;
    let mut overage_cost = 0.0;
    let mut parts = Vec::with_capacity(2);

    if included > 0 {
        let prorated = pricing.base_cost / days_in_period as f64 * days_in_segment as f64;
        let floor = included as f64 / RESPONSES_PER_MILLION * EFFECTIVE_INCLUDED_RATE_PER_MILLION;
        included_cost = prorated.max(floor);
        parts.push(format!(
            "{days_in_segment} days × (${:.2} ÷ {days_in_period}) = ${included_cost:.2}",
            pricing.base_cost
        ));
    }
    if overage > 0 {
        let millions = overage as f64 / RESPONSES_PER_MILLION;
        overage_cost = millions * pricing.overage_per_million;
        parts.push(format!(
            "{millions:.2}M × ${:.2}/M = ${overage_cost:.2}",
            pricing.overage_per_million
        ));
    }

    let total = included_cost + overage_cost;
    let discount_off = discount.map_or(0.0, |d| d.amount_off(included_cost, total));

    let cost_type = match (included > 0, overage > 0) {
        (true, true) => CostType::IncludedAndOverage,
        (false, true) => CostType::Overage,
        _ => CostType::Included,
    };

    SegmentCost {
        amount: total - discount_off,
        cost_type,
        calculation: parts.join(" + "),
    }
}
