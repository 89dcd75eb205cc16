//! Cost report assembly.
//!
//! Quota consumption is organization-wide, so every segment is priced from the *basis*
//! rows (all usage) and the caller's *filtered* rows only receive their proportional
//! share of that price. The filtered share is then split across domains the same way.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::cost::{calculate_segment_cost, CostType};
use crate::cycle::BillingAnchor;
use crate::discount::DiscountInfo;
use crate::pricing::PlanPricingCatalog;
use crate::segment::split_interval;
use crate::subscription::SubscriptionInfo;
use crate::usage::{rows_in_range, sum_responses, sum_responses_in_range, timed_rows, UsageRow};

/// Hint returned for plans without usage-based billing.
pub const UNSUPPORTED_PLAN_HINT: &str =
    "Your plan does not have usage-based costs. Upgrade to Developer or higher.";

/// Domain label used for rows without one.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Cost of the filtered usage inside one billing segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSegmentBreakdown {
    /// Segment start (RFC3339).
    pub start: String,
    /// Segment end (RFC3339).
    pub end: String,
    /// Filtered responses in the segment.
    pub responses: u64,
    /// Organization-wide responses in the segment.
    pub total_responses: u64,
    /// Filtered share of the segment cost.
    pub cost: f64,
    /// Quota portions the organization-wide usage fell into.
    pub cost_type: CostType,
    /// How the organization-wide segment cost was computed.
    pub calculation: String,
    /// Quota left when the segment began.
    #[serde(rename = "included_remaining")]
    pub included_at_start: u64,
}

/// Cost attributed to one group (domain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostByGroup {
    /// Group label.
    pub group: String,
    /// Responses in the group.
    pub responses: u64,
    /// Cost attributed to the group.
    pub cost: f64,
}

/// Estimated cost of usage over a reporting interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    /// Plan id.
    pub plan_id: i64,
    /// Plan display name.
    pub plan_name: String,
    /// Interval start (RFC3339).
    pub interval_start: String,
    /// Interval end (RFC3339).
    pub interval_end: String,
    /// Filtered responses priced by the report.
    pub total_responses: u64,
    /// Total cost of the filtered responses.
    pub total_cost: f64,
    /// Whether the plan has usage-based costs at all.
    pub supported: bool,
    /// Why the report is empty when `supported` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsupported_hint: Option<String>,
    /// Per-segment breakdown, ordered by start.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<CostSegmentBreakdown>,
    /// Per-domain breakdown, most expensive first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_domain: Vec<CostByGroup>,
}

/// Inputs to [`build_report`].
#[derive(Debug, Clone, Copy)]
pub struct CostQuery<'a> {
    /// The caller's plan.
    pub plan: &'a SubscriptionInfo,
    /// Responses included per cycle.
    pub monthly_quota: u64,
    /// Active discount, if any.
    pub discount: Option<&'a DiscountInfo>,
    /// Billing cycle anchor.
    pub anchor: BillingAnchor,
    /// Reporting interval start (inclusive).
    pub interval_start: DateTime<Utc>,
    /// Reporting interval end (exclusive).
    pub interval_end: DateTime<Utc>,
    /// Usage matching the caller's filters.
    pub filtered: &'a [UsageRow],
    /// Organization-wide usage from the start of the first billing cycle.
    pub basis: &'a [UsageRow],
}

#[derive(Default)]
struct DomainTotals {
    responses: u64,
    cost: f64,
}

/// Format an instant the way reports carry it: RFC3339, whole seconds, `Z`.
#[must_use]
pub fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build the cost report for `query` using prices from `catalog`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build_report(catalog: &PlanPricingCatalog, query: &CostQuery<'_>) -> CostReport {
    let plan_id = query.plan.id;
    let filtered = timed_rows(query.filtered);

    let mut report = CostReport {
        plan_id,
        plan_name: query.plan.effective_plan_name().to_string(),
        interval_start: format_instant(query.interval_start),
        interval_end: format_instant(query.interval_end),
        total_responses: 0,
        total_cost: 0.0,
        supported: catalog.allows_overages(plan_id),
        unsupported_hint: None,
        segments: Vec::new(),
        by_domain: Vec::new(),
    };

    if !report.supported {
        tracing::debug!(plan_id, "Plan has no usage-based costs");
        report.total_responses =
            sum_responses_in_range(&filtered, query.interval_start, query.interval_end);
        report.unsupported_hint = Some(UNSUPPORTED_PLAN_HINT.to_string());
        return report;
    }

    let pricing = catalog.lookup(plan_id);
    let basis = timed_rows(query.basis);
    let segments = split_interval(query.interval_start, query.interval_end, &query.anchor);

    tracing::debug!(
        plan_id,
        interval_start = %report.interval_start,
        interval_end = %report.interval_end,
        segments = segments.len(),
        filtered_rows = filtered.len(),
        basis_rows = basis.len(),
        "Building usage cost report"
    );

    let mut by_domain: BTreeMap<&str, DomainTotals> = BTreeMap::new();
    let mut breakdowns = Vec::with_capacity(segments.len());
    let mut total_cost = 0.0;
    let mut total_responses: u64 = 0;

    for segment in segments {
        let usage_before =
            sum_responses_in_range(&basis, segment.billing_period_start, segment.start);
        let segment = segment.with_usage_before(usage_before);

        let segment_total = sum_responses_in_range(&basis, segment.start, segment.end);
        let segment_filtered = rows_in_range(&filtered, segment.start, segment.end);
        let filtered_responses = sum_responses(&segment_filtered);

        let cost = calculate_segment_cost(
            segment_total,
            &segment,
            &pricing,
            query.monthly_quota,
            query.discount,
        );
        let filtered_cost = if segment_total > 0 {
            cost.amount * (filtered_responses as f64 / segment_total as f64)
        } else {
            0.0
        };

        tracing::trace!(
            start = %segment.start,
            end = %segment.end,
            usage_before,
            segment_total,
            filtered_responses,
            cost = cost.amount,
            filtered_cost,
            "Priced billing segment"
        );

        total_cost += filtered_cost;
        total_responses = total_responses.saturating_add(filtered_responses);

        let mut segment_domains: BTreeMap<&str, u64> = BTreeMap::new();
        for timed in &segment_filtered {
            let responses = segment_domains.entry(timed.row.group_domain()).or_default();
            *responses = responses.saturating_add(timed.row.responses);
        }
        for (domain, responses) in segment_domains {
            let entry = by_domain.entry(domain).or_default();
            entry.responses = entry.responses.saturating_add(responses);
            if filtered_responses > 0 {
                entry.cost += filtered_cost * (responses as f64 / filtered_responses as f64);
            }
        }

        breakdowns.push((
            segment.start,
            CostSegmentBreakdown {
                start: format_instant(segment.start),
                end: format_instant(segment.end),
                responses: filtered_responses,
                total_responses: segment_total,
                cost: filtered_cost,
                cost_type: cost.cost_type,
                calculation: cost.calculation,
                included_at_start: query.monthly_quota.saturating_sub(usage_before),
            },
        ));
    }

    breakdowns.sort_by_key(|(start, _)| *start);

    let mut domains: Vec<CostByGroup> = by_domain
        .into_iter()
        .map(|(group, totals)| CostByGroup {
            group: group.to_string(),
            responses: totals.responses,
            cost: totals.cost,
        })
        .collect();
    domains.sort_by(|a, b| b.cost.total_cmp(&a.cost).then_with(|| a.group.cmp(&b.group)));

    report.total_cost = total_cost;
    report.total_responses = total_responses;
    report.segments = breakdowns.into_iter().map(|(_, breakdown)| breakdown).collect();
    report.by_domain = domains;
    report
}
