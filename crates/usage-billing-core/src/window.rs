//! Reporting window resolution and plan lookback limits.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};
use crate::report::format_instant;

/// Aggregation interval of usage rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageInterval {
    /// Per-minute buckets.
    Minute,
    /// Per-hour buckets.
    #[default]
    Hour,
    /// Per-day buckets.
    Day,
}

impl UsageInterval {
    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// Lookback used when no start is given, with its label.
    #[must_use]
    pub fn default_lookback(&self) -> (Duration, &'static str) {
        match self {
            Self::Minute => (Duration::minutes(60), "past 60 minutes"),
            Self::Hour => (Duration::hours(24), "past 24 hours"),
            Self::Day => (Duration::days(30), "past 30 days"),
        }
    }
}

impl fmt::Display for UsageInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageInterval {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "hour" => Ok(Self::Hour),
            "minute" => Ok(Self::Minute),
            "day" => Ok(Self::Day),
            _ => Err(BillingError::InvalidInterval {
                interval: s.to_string(),
            }),
        }
    }
}

/// A resolved reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageWindow {
    /// Aggregation interval.
    pub interval: UsageInterval,
    /// Window start (inclusive).
    pub start: DateTime<Utc>,
    /// Window end (exclusive).
    pub end: DateTime<Utc>,
    /// Label of the default that filled in a missing start, e.g. `"past 24 hours"`.
    pub default_label: Option<&'static str>,
    /// Whether either bound was defaulted.
    pub used_defaults: bool,
}

impl UsageWindow {
    /// Window start as RFC3339.
    #[must_use]
    pub fn formatted_start(&self) -> String {
        format_instant(self.start)
    }

    /// Window end as RFC3339.
    #[must_use]
    pub fn formatted_end(&self) -> String {
        format_instant(self.end)
    }
}

fn parse_bound(field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| BillingError::InvalidTimestamp {
            field,
            value: raw.to_string(),
        })
}

/// Resolve a reporting window from optional RFC3339 bounds.
///
/// A missing `to` is `now` truncated to the minute; a missing `from` is `to` minus the
/// interval's default lookback.
///
/// # Errors
///
/// Returns an error for an unknown interval, an unparsable bound, or `from >= to`.
pub fn resolve_usage_window(
    interval: &str,
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
) -> Result<UsageWindow> {
    let interval: UsageInterval = interval.parse()?;
    let from = from.filter(|s| !s.trim().is_empty());
    let to = to.filter(|s| !s.trim().is_empty());

    let mut used_defaults = false;
    let mut default_label = None;

    let end = match to {
        Some(raw) => parse_bound("to", raw)?,
        None => {
            used_defaults = true;
            now.duration_trunc(Duration::minutes(1)).unwrap_or(now)
        }
    };
    let start = match from {
        Some(raw) => parse_bound("from", raw)?,
        None => {
            let (lookback, label) = interval.default_lookback();
            used_defaults = true;
            default_label = Some(label);
            end - lookback
        }
    };

    if start >= end {
        return Err(BillingError::EmptyWindow {
            start: format_instant(start),
            end: format_instant(end),
        });
    }

    Ok(UsageWindow {
        interval,
        start,
        end,
        default_label,
        used_defaults,
    })
}

/// How far back a plan tier may query usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLookback {
    /// Tier name.
    pub tier: &'static str,
    /// Human label of the lookback.
    pub label: &'static str,
    hours: i64,
}

impl PlanLookback {
    /// Maximum lookback.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::hours(self.hours)
    }
}

const STARTER: PlanLookback = PlanLookback {
    tier: "Starter",
    label: "24 hours",
    hours: 24,
};

const DEVELOPER: PlanLookback = PlanLookback {
    tier: "Developer",
    label: "7 days",
    hours: 7 * 24,
};

const GROWTH: PlanLookback = PlanLookback {
    tier: "Growth",
    label: "30 days",
    hours: 30 * 24,
};

const SCALE: PlanLookback = PlanLookback {
    tier: "Scale",
    label: "90 days",
    hours: 90 * 24,
};

/// Lookback allowed for a plan id.
#[must_use]
pub fn plan_lookback(plan_id: i64) -> PlanLookback {
    match plan_id {
        1 | 5 => STARTER,
        2 => DEVELOPER,
        3 => GROWTH,
        _ => SCALE,
    }
}

/// Smallest tier whose lookback covers `lookback`. Anything beyond Growth maps to Scale.
#[must_use]
pub fn required_tier_for_lookback(lookback: Duration) -> PlanLookback {
    [STARTER, DEVELOPER, GROWTH]
        .into_iter()
        .find(|tier| lookback <= tier.duration())
        .unwrap_or(SCALE)
}

/// Check that `window` does not reach further back than the plan allows.
///
/// # Errors
///
/// Returns [`BillingError::LookbackExceeded`] with upgrade guidance when it does.
pub fn validate_lookback(plan_id: i64, window: &UsageWindow, now: DateTime<Utc>) -> Result<()> {
    let allowed = plan_lookback(plan_id);
    let requested = now - window.start;
    if requested <= allowed.duration() {
        return Ok(());
    }

    let required = required_tier_for_lookback(requested);
    let guidance = if required.tier.eq_ignore_ascii_case(allowed.tier) {
        "Contact support for extended lookback options.".to_string()
    } else {
        format!("Upgrade to {} for up to {} lookback.", required.tier, required.label)
    };

    tracing::debug!(
        plan_id,
        tier = allowed.tier,
        requested_from = %window.start,
        "Usage window exceeds plan lookback"
    );

    Err(BillingError::LookbackExceeded {
        tier: allowed.tier,
        allowed: allowed.label,
        requested_from: window.formatted_start(),
        guidance,
    })
}
