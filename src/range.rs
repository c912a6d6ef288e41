//! Resolution of `GET /api/metrics` query parameters into a time window.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::SummaryRange;

// ---

/// Query parameters for the history endpoint.
///
/// `from` / `to` are RFC 3339 instants; `range` is one of `24h`, `7d`, `30d`,
/// `today` or `custom` and is ignored when `from` is given.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Resolve the window, rejecting anything that is not strictly `from < to`.
pub fn resolve_range(query: &RangeQuery, now: DateTime<Utc>) -> Result<SummaryRange> {
    // ---
    let to = match query.to.as_deref() {
        Some(raw) => parse_instant(raw, "to")?,
        None => now,
    };

    let (from, label) = if let Some(raw) = query.from.as_deref() {
        let from = parse_instant(raw, "from")?;
        let label = format!("{} – {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"));
        (from, label)
    } else {
        match query.range.as_deref() {
            Some("custom") => {
                return Err(AppError::InvalidRange(
                    "Custom range requires both 'from' and 'to' parameters".to_string(),
                ))
            }
            Some("7d") => (to - Duration::days(7), "Last 7 days".to_string()),
            Some("30d") => (to - Duration::days(30), "Last 30 days".to_string()),
            Some("today") => (start_of_day(to), "Today".to_string()),
            _ => (to - Duration::hours(24), "Last 24 hours".to_string()),
        }
    };

    if from >= to {
        return Err(AppError::InvalidRange(
            "'from' must be earlier than 'to'".to_string(),
        ));
    }

    Ok(SummaryRange { from, to, label })
}

fn parse_instant(raw: &str, name: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidRange(format!("Invalid '{name}' value")))
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(at)
}
