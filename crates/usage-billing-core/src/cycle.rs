//! Billing cycle resolution.
//!
//! A billing cycle is one month long and anchored on the subscription's renewal date,
//! or its start date when no renewal date is known, or the calendar month otherwise.
//!
//! # Month-end convention
//!
//! Cycle boundary `k` is always `anchor + k months`, never derived from the previous boundary.
//! When the anchor's day does not exist in the target month the boundary clamps to the
//! last day of that month, so an anchor on Jan 31 yields boundaries Feb 28 (or 29),
//! Mar 31, Apr 30, May 31. Because no boundary is derived from a previous clamped one,
//! the anchor day is never lost.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::subscription::SubscriptionWindow;

/// A half-open billing window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingWindow {
    /// First instant of the cycle.
    pub start: DateTime<Utc>,
    /// First instant after the cycle.
    pub end: DateTime<Utc>,
}

impl BillingWindow {
    /// Whether `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Recurring anchors for the billing cycle, normalized to UTC midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BillingAnchor {
    /// Next (or any past or future) renewal date.
    pub renewal_date: Option<DateTime<Utc>>,
    /// Subscription start date.
    pub start_date: Option<DateTime<Utc>>,
}

impl BillingAnchor {
    /// Anchor on a renewal date.
    #[must_use]
    pub fn renewal(date: DateTime<Utc>) -> Self {
        Self {
            renewal_date: Some(date),
            start_date: None,
        }
    }

    /// Anchor on a subscription start date.
    #[must_use]
    pub fn started(date: DateTime<Utc>) -> Self {
        Self {
            renewal_date: None,
            start_date: Some(date),
        }
    }

    /// Parse the anchor from an upstream subscription window. Missing, empty, or
    /// unparsable dates are treated as absent.
    #[must_use]
    pub fn from_window(window: Option<&SubscriptionWindow>) -> Self {
        let Some(window) = window else {
            return Self::default();
        };
        Self {
            renewal_date: window.renewal_date.as_deref().and_then(parse_subscription_date),
            start_date: window.start_date.as_deref().and_then(parse_subscription_date),
        }
    }

    /// The billing window containing `now`.
    #[must_use]
    pub fn window_at(&self, now: DateTime<Utc>) -> BillingWindow {
        resolve_window(now, self.renewal_date, self.start_date)
    }

    /// The billing window containing the current wall-clock time.
    #[must_use]
    pub fn current_window(&self) -> BillingWindow {
        self.window_at(Utc::now())
    }
}

/// Compute the billing window containing `now`.
///
/// A renewal date is used as anchor whether it lies in the past or the future. A start
/// date is only used once it has passed. Without a usable anchor the calendar month in
/// UTC is returned.
#[must_use]
pub fn resolve_window(
    now: DateTime<Utc>,
    renewal_date: Option<DateTime<Utc>>,
    start_date: Option<DateTime<Utc>>,
) -> BillingWindow {
    let anchored = match (renewal_date, start_date) {
        (Some(renewal), _) => window_from_anchor(now, renewal),
        (None, Some(start)) if start <= now => window_from_anchor(now, start),
        _ => None,
    };
    anchored.unwrap_or_else(|| calendar_month(now))
}

/// The calendar month containing `now`, in UTC.
#[must_use]
pub fn calendar_month(now: DateTime<Utc>) -> BillingWindow {
    let start = first_of_month_utc(now);
    let end = start
        .checked_add_months(Months::new(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    BillingWindow { start, end }
}

fn window_from_anchor(now: DateTime<Utc>, anchor: DateTime<Utc>) -> Option<BillingWindow> {
    // Start from the month distance, which lands within one step of the answer.
    let mut k = month_index(now) - month_index(anchor);
    while shift_months(anchor, k)? <= now {
        k += 1;
    }
    while shift_months(anchor, k - 1)? > now {
        k -= 1;
    }
    Some(BillingWindow {
        start: shift_months(anchor, k - 1)?,
        end: shift_months(anchor, k)?,
    })
}

fn month_index(at: DateTime<Utc>) -> i64 {
    i64::from(at.year()) * 12 + i64::from(at.month0())
}

/// `anchor + months`, clamping to month end. `None` outside chrono's range.
fn shift_months(anchor: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let step = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        anchor.checked_add_months(step)
    } else {
        anchor.checked_sub_months(step)
    }
}

/// Midnight UTC on the first day of `at`'s month.
#[must_use]
pub fn first_of_month_utc(at: DateTime<Utc>) -> DateTime<Utc> {
    let date = at.date_naive();
    let first = date - Days::new(u64::from(date.day0()));
    first.and_time(NaiveTime::MIN).and_utc()
}

/// Parse a subscription date as sent by the account API.
///
/// Accepts RFC3339, `YYYY-MM-DDTHH:MM:SS` (taken as UTC), and `YYYY-MM-DD`. The result is
/// truncated to midnight UTC. Blank or unparsable input yields `None`.
#[must_use]
pub fn parse_subscription_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|ts| ts.and_utc()))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
        .ok()?;
    Some(parsed.date_naive().and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn calendar_month_without_anchor() {
        let now = Utc.with_ymd_and_hms(2026, 2, 14, 13, 45, 0).unwrap();
        let window = resolve_window(now, None, None);
        assert_eq!(window.start, utc(2026, 2, 1));
        assert_eq!(window.end, utc(2026, 3, 1));
    }

    #[test]
    fn calendar_month_rolls_over_year() {
        let window = resolve_window(utc(2025, 12, 31), None, None);
        assert_eq!(window.start, utc(2025, 12, 1));
        assert_eq!(window.end, utc(2026, 1, 1));
    }

    #[test]
    fn renewal_anchor_in_the_past() {
        let window = resolve_window(utc(2026, 2, 20), Some(utc(2025, 6, 15)), None);
        assert_eq!(window.start, utc(2026, 2, 15));
        assert_eq!(window.end, utc(2026, 3, 15));
    }

    #[test]
    fn renewal_anchor_in_the_future() {
        let window = resolve_window(utc(2026, 2, 20), Some(utc(2027, 1, 15)), None);
        assert_eq!(window.start, utc(2026, 2, 15));
        assert_eq!(window.end, utc(2026, 3, 15));
    }

    #[test]
    fn now_on_boundary_starts_new_cycle() {
        let window = resolve_window(utc(2026, 3, 15), Some(utc(2026, 3, 15)), None);
        assert_eq!(window.start, utc(2026, 3, 15));
        assert_eq!(window.end, utc(2026, 4, 15));
        assert!(window.contains(utc(2026, 3, 15)));
    }

    #[test]
    fn start_date_used_once_passed() {
        let window = resolve_window(utc(2026, 2, 20), None, Some(utc(2025, 11, 3)));
        assert_eq!(window.start, utc(2026, 2, 3));
        assert_eq!(window.end, utc(2026, 3, 3));
    }

    #[test]
    fn future_start_date_falls_back_to_calendar() {
        let window = resolve_window(utc(2026, 2, 20), None, Some(utc(2026, 5, 3)));
        assert_eq!(window.start, utc(2026, 2, 1));
        assert_eq!(window.end, utc(2026, 3, 1));
    }

    #[test]
    fn current_window_contains_wall_clock() {
        let anchor = BillingAnchor::renewal(utc(2025, 1, 31));
        let before = Utc::now();
        let window = anchor.current_window();
        let after = Utc::now();
        assert!(window.start <= after);
        assert!(before < window.end);
        let days = (window.end - window.start).num_days();
        assert!((28..=31).contains(&days));

        let calendar = BillingAnchor::default().current_window();
        assert_eq!(calendar.start.day(), 1);
        assert_eq!(calendar.end.day(), 1);
        assert_eq!(calendar.start, first_of_month_utc(calendar.start));
    }

    #[test]
    fn renewal_takes_precedence_over_start() {
        let window = resolve_window(
            utc(2026, 2, 20),
            Some(utc(2026, 1, 10)),
            Some(utc(2025, 11, 3)),
        );
        assert_eq!(window.start, utc(2026, 2, 10));
    }

    #[test]
    fn month_end_anchor_clamps_without_drift() {
        let anchor = Some(utc(2026, 1, 31));

        let feb = resolve_window(utc(2026, 2, 10), anchor, None);
        assert_eq!(feb.start, utc(2026, 1, 31));
        assert_eq!(feb.end, utc(2026, 2, 28));

        let mar = resolve_window(utc(2026, 3, 5), anchor, None);
        assert_eq!(mar.start, utc(2026, 2, 28));
        assert_eq!(mar.end, utc(2026, 3, 31));

        let may = resolve_window(utc(2026, 5, 5), anchor, None);
        assert_eq!(may.start, utc(2026, 4, 30));
        assert_eq!(may.end, utc(2026, 5, 31));
    }

    #[test]
    fn leap_year_february() {
        let window = resolve_window(utc(2028, 2, 29), Some(utc(2027, 8, 31)), None);
        assert_eq!(window.start, utc(2028, 2, 29));
        assert_eq!(window.end, utc(2028, 3, 31));
    }

    #[test]
    fn distant_anchor_resolves() {
        let window = resolve_window(utc(2026, 2, 20), Some(utc(1990, 2, 1)), None);
        assert_eq!(window.start, utc(2026, 2, 1));
        assert_eq!(window.end, utc(2026, 3, 1));
    }

    #[test]
    fn parse_subscription_date_formats() {
        assert_eq!(parse_subscription_date("2026-02-15"), Some(utc(2026, 2, 15)));
        assert_eq!(parse_subscription_date("2026-02-15T18:30:00"), Some(utc(2026, 2, 15)));
        assert_eq!(parse_subscription_date(" 2026-02-15T18:30:00Z "), Some(utc(2026, 2, 15)));
        // Normalized to UTC before truncation.
        assert_eq!(parse_subscription_date("2026-02-15T23:30:00-05:00"), Some(utc(2026, 2, 16)));
    }

    #[test]
    fn parse_subscription_date_rejects_garbage() {
        assert_eq!(parse_subscription_date(""), None);
        assert_eq!(parse_subscription_date("   "), None);
        assert_eq!(parse_subscription_date("15/02/2026"), None);
    }

    #[test]
    fn anchor_from_window() {
        let window = SubscriptionWindow {
            start_date: Some("bogus".into()),
            renewal_date: Some("2026-03-01".into()),
        };
        let anchor = BillingAnchor::from_window(Some(&window));
        assert_eq!(anchor.renewal_date, Some(utc(2026, 3, 1)));
        assert_eq!(anchor.start_date, None);
        assert_eq!(BillingAnchor::from_window(None), BillingAnchor::default());
    }

    #[test]
    fn first_of_month() {
        let at = Utc.with_ymd_and_hms(2026, 7, 19, 8, 1, 2).unwrap();
        assert_eq!(first_of_month_utc(at), utc(2026, 7, 1));
    }
}
