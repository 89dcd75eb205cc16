//! Splitting a reporting interval into billing-cycle-aligned segments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cycle::BillingAnchor;

/// Upper bound on segments produced for one interval. Intervals spanning more cycles
/// are truncated after this many.
pub const MAX_SEGMENTS: usize = 24;

/// The part of a reporting interval that falls inside one billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingSegment {
    /// Segment start (inclusive).
    pub start: DateTime<Utc>,
    /// Segment end (exclusive).
    pub end: DateTime<Utc>,
    /// Start of the enclosing billing cycle.
    pub billing_period_start: DateTime<Utc>,
    /// End of the enclosing billing cycle.
    pub billing_period_end: DateTime<Utc>,
    /// Organization-wide responses counted in the cycle before `start`.
    pub cumulative_usage_at_start: u64,
}

impl BillingSegment {
    /// Copy of the segment with the usage counted before it set.
    #[must_use]
    pub fn with_usage_before(self, usage: u64) -> Self {
        Self {
            cumulative_usage_at_start: usage,
            ..self
        }
    }
}

/// Partition `[interval_start, interval_end)` into contiguous segments, one per billing
/// cycle touched, at most [`MAX_SEGMENTS`]. `cumulative_usage_at_start` is left at zero.
#[must_use]
pub fn split_interval(
    interval_start: DateTime<Utc>,
    interval_end: DateTime<Utc>,
    anchor: &BillingAnchor,
) -> Vec<BillingSegment> {
    let mut segments = Vec::with_capacity(8);
    let mut current = interval_start;

    while segments.len() < MAX_SEGMENTS && current < interval_end {
        let window = anchor.window_at(current);
        let end = window.end.min(interval_end);
        if end <= current {
            break;
        }
        segments.push(BillingSegment {
            start: current,
            end,
            billing_period_start: window.start,
            billing_period_end: window.end,
            cumulative_usage_at_start: 0,
        });
        current = end;
    }

    if current < interval_end {
        tracing::debug!(
            interval_start = %interval_start,
            interval_end = %interval_end,
            covered_until = %current,
            "Interval truncated at segment limit"
        );
    }
    segments
}

/// Start of the billing cycle containing `interval_start`.
///
/// Callers that fetch usage with filters use this as the lower bound for the unfiltered
/// basis rows, since quota consumption is counted from the cycle start. Returns
/// `interval_start` for an empty interval.
#[must_use]
pub fn earliest_billing_period_start(
    interval_start: DateTime<Utc>,
    interval_end: DateTime<Utc>,
    anchor: &BillingAnchor,
) -> DateTime<Utc> {
    split_interval(interval_start, interval_end, anchor)
        .first()
        .map_or(interval_start, |segment| segment.billing_period_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn assert_covers(segments: &[BillingSegment], start: DateTime<Utc>, end: DateTime<Utc>) {
        assert_eq!(segments.first().unwrap().start, start);
        assert_eq!(segments.last().unwrap().end, end);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for segment in segments {
            assert!(segment.start < segment.end);
            assert!(segment.billing_period_start <= segment.start);
            assert!(segment.end <= segment.billing_period_end);
        }
    }

    #[test]
    fn single_cycle_interval() {
        let segments = split_interval(utc(2026, 2, 1), utc(2026, 2, 2), &BillingAnchor::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].billing_period_start, utc(2026, 2, 1));
        assert_eq!(segments[0].billing_period_end, utc(2026, 3, 1));
        assert_covers(&segments, utc(2026, 2, 1), utc(2026, 2, 2));
    }

    #[test]
    fn interval_crossing_renewal() {
        let anchor = BillingAnchor::renewal(utc(2026, 3, 15));
        let start = utc(2026, 2, 10);
        let end = utc(2026, 4, 20);
        let segments = split_interval(start, end, &anchor);

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].billing_period_start, utc(2026, 1, 15));
        assert_eq!(segments[0].end, utc(2026, 2, 15));
        assert_eq!(segments[1].start, utc(2026, 2, 15));
        assert_eq!(segments[1].end, utc(2026, 3, 15));
        assert_eq!(segments[3].start, utc(2026, 4, 15));
        assert_eq!(segments[3].billing_period_end, utc(2026, 5, 15));
        assert_covers(&segments, start, end);
    }

    #[test]
    fn unaligned_start_time_keeps_exact_bounds() {
        let start = Utc.with_ymd_and_hms(2026, 1, 20, 7, 13, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 3, 1, 0, 0).unwrap();
        let segments = split_interval(start, end, &BillingAnchor::default());
        assert_eq!(segments.len(), 2);
        assert_covers(&segments, start, end);
    }

    #[test]
    fn empty_or_inverted_interval_has_no_segments() {
        let anchor = BillingAnchor::default();
        assert!(split_interval(utc(2026, 2, 1), utc(2026, 2, 1), &anchor).is_empty());
        assert!(split_interval(utc(2026, 2, 2), utc(2026, 2, 1), &anchor).is_empty());
    }

    #[test]
    fn long_interval_is_capped() {
        let segments = split_interval(utc(2020, 1, 1), utc(2026, 1, 1), &BillingAnchor::default());
        assert_eq!(segments.len(), MAX_SEGMENTS);
        assert_eq!(segments.last().unwrap().end, utc(2022, 1, 1));
    }

    #[test]
    fn coverage_holds_for_many_anchors() {
        let start = Utc.with_ymd_and_hms(2025, 11, 29, 17, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 6, 2, 3, 0, 0).unwrap();
        for day in 1..=31 {
            for anchor in [
                BillingAnchor::renewal(utc(2026, 1, day)),
                BillingAnchor::started(utc(2025, 1, day)),
            ] {
                let segments = split_interval(start, end, &anchor);
                assert_covers(&segments, start, end);
            }
        }
    }

    #[test]
    fn earliest_period_start_uses_first_cycle() {
        let anchor = BillingAnchor::renewal(utc(2026, 3, 15));
        assert_eq!(
            earliest_billing_period_start(utc(2026, 2, 10), utc(2026, 2, 12), &anchor),
            utc(2026, 1, 15)
        );
        assert_eq!(
            earliest_billing_period_start(utc(2026, 2, 10), utc(2026, 2, 10), &anchor),
            utc(2026, 2, 10)
        );
    }
}
