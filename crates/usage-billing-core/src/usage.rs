//! Usage rows reported by the analytics API.
//!
//! Rows carry their timestamp as the raw RFC3339 string they arrived with. Rows whose
//! timestamp does not parse are left out of every sum; they are never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregated usage bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRow {
    /// Bucket start (RFC3339).
    pub timestamp: String,

    /// Endpoint hostname the usage was served on, if grouped by domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Requests received.
    #[serde(default)]
    pub requests: u64,

    /// Responses served; the billable quantity.
    #[serde(default)]
    pub responses: u64,
}

impl UsageRow {
    /// Create a row at `timestamp` with `responses` and no domain.
    #[must_use]
    pub fn new(timestamp: impl Into<String>, responses: u64) -> Self {
        Self {
            timestamp: timestamp.into(),
            domain: None,
            requests: responses,
            responses,
        }
    }

    /// Set the domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Parsed timestamp, or `None` if the row carries an unparsable one.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Domain used for grouping: trimmed, with blank or missing domains as `"unknown"`.
    #[must_use]
    pub fn group_domain(&self) -> &str {
        match self.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => domain,
            _ => "unknown",
        }
    }
}

/// Dimensional filters the caller applied when fetching usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageFilters {
    /// API key value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Endpoint hostname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,

    /// RPC method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl UsageFilters {
    /// True when no filter narrows the usage, so the filtered rows already are the
    /// organization-wide basis.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.api_key, &self.fqdn, &self.method]
            .iter()
            .all(|f| f.as_deref().map_or(true, |v| v.trim().is_empty()))
    }
}

/// A row whose timestamp has been parsed once up front.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedRow<'a> {
    pub at: DateTime<Utc>,
    pub row: &'a UsageRow,
}

/// Parse every row's timestamp, dropping rows that do not parse.
pub(crate) fn timed_rows(rows: &[UsageRow]) -> Vec<TimedRow<'_>> {
    let parsed: Vec<TimedRow<'_>> = rows
        .iter()
        .filter_map(|row| row.parsed_timestamp().map(|at| TimedRow { at, row }))
        .collect();
    let skipped = rows.len() - parsed.len();
    if skipped > 0 {
        tracing::debug!(
            skipped,
            total = rows.len(),
            "Skipping usage rows with unparsable timestamps"
        );
    }
    parsed
}

/// Rows with `start <= at < end`.
pub(crate) fn rows_in_range<'a>(
    rows: &[TimedRow<'a>],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<TimedRow<'a>> {
    rows.iter()
        .filter(|r| r.at >= start && r.at < end)
        .copied()
        .collect()
}

/// Total responses of rows with `start <= at < end`.
pub(crate) fn sum_responses_in_range(
    rows: &[TimedRow<'_>],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> u64 {
    rows.iter()
        .filter(|r| r.at >= start && r.at < end)
        .map(|r| r.row.responses)
        .fold(0, u64::saturating_add)
}

/// Total responses of all rows.
pub(crate) fn sum_responses(rows: &[TimedRow<'_>]) -> u64 {
    rows.iter()
        .map(|r| r.row.responses)
        .fold(0, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let row = UsageRow::new("2026-02-01T02:00:00+02:00", 10);
        assert_eq!(row.parsed_timestamp(), Some(at(1, 0)));
    }

    #[test]
    fn unparsable_timestamp_is_none() {
        assert!(UsageRow::new("yesterday", 10).parsed_timestamp().is_none());
        assert!(UsageRow::new("2026-02-01", 10).parsed_timestamp().is_none());
    }

    #[test]
    fn group_domain_defaults_to_unknown() {
        assert_eq!(UsageRow::new("", 1).group_domain(), "unknown");
        assert_eq!(UsageRow::new("", 1).with_domain("   ").group_domain(), "unknown");
        assert_eq!(
            UsageRow::new("", 1).with_domain(" api.example.com ").group_domain(),
            "api.example.com"
        );
    }

    #[test]
    fn range_is_half_open_and_skips_bad_rows() {
        let rows = vec![
            UsageRow::new("2026-02-01T00:00:00Z", 1),
            UsageRow::new("2026-02-01T12:00:00Z", 2),
            UsageRow::new("not-a-time", 100),
            UsageRow::new("2026-02-02T00:00:00Z", 4),
        ];
        let timed = timed_rows(&rows);
        assert_eq!(timed.len(), 3);
        assert_eq!(sum_responses(&timed), 7);
        assert_eq!(sum_responses_in_range(&timed, at(1, 0), at(2, 0)), 3);
        assert_eq!(rows_in_range(&timed, at(1, 12), at(3, 0)).len(), 2);
    }

    #[test]
    fn sums_saturate() {
        let rows = vec![
            UsageRow::new("2026-02-01T00:00:00Z", u64::MAX),
            UsageRow::new("2026-02-01T01:00:00Z", 1),
        ];
        let timed = timed_rows(&rows);
        assert_eq!(sum_responses(&timed), u64::MAX);
        assert_eq!(sum_responses_in_range(&timed, at(1, 0), at(2, 0)), u64::MAX);
    }

    #[test]
    fn filters_empty_when_blank() {
        assert!(UsageFilters::default().is_empty());
        let blank = UsageFilters {
            api_key: Some("  ".into()),
            ..UsageFilters::default()
        };
        assert!(blank.is_empty());
        let fqdn = UsageFilters {
            fqdn: Some("api-base-mainnet.n.dwellir.com".into()),
            ..UsageFilters::default()
        };
        assert!(!fqdn.is_empty());
    }

    #[test]
    fn deserializes_row_without_domain() {
        let row: UsageRow = serde_json::from_str(
            r#"{"timestamp": "2026-02-01T00:00:00Z", "requests": 5, "responses": 4}"#,
        )
        .unwrap();
        assert_eq!(row.domain, None);
        assert_eq!(row.responses, 4);
    }
}
