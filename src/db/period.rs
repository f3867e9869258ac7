//! Aggregation period windows for the voice-time ledger.
//!
//! A period resolves to a half-open `[start, end)` window around a reference
//! instant. Window computation is pure and always UTC, so adding a period
//! never touches the ledger's write path: writes land in day buckets and
//! coarser periods just sum more of them.

use super::StoreError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Aggregation period for ledger queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// One UTC calendar day.
    Daily,
    /// One ISO week, Monday through Sunday.
    Weekly,
    /// One calendar month.
    Monthly,
    /// One calendar year.
    Yearly,
    /// Everything ever recorded.
    AllTime,
}

impl Period {
    /// Compute the `[start, end)` window containing `reference`.
    pub fn window(&self, reference: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let day = reference.date_naive();
        match self {
            Period::Daily => {
                let start = day_start(day);
                (start, start + Duration::days(1))
            }
            Period::Weekly => {
                let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
                let start = day_start(monday);
                (start, start + Duration::days(7))
            }
            Period::Monthly => {
                let first = day.with_day(1).unwrap_or(day);
                let next = if first.month() == 12 {
                    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
                }
                .unwrap_or(first);
                (day_start(first), day_start(next))
            }
            Period::Yearly => {
                let first = NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day);
                let next = NaiveDate::from_ymd_opt(day.year() + 1, 1, 1).unwrap_or(first);
                (day_start(first), day_start(next))
            }
            Period::AllTime => (DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::MAX_UTC),
        }
    }

    /// UTC midnight opening the day bucket that contains `at`.
    pub fn bucket_start(at: DateTime<Utc>) -> DateTime<Utc> {
        day_start(at.date_naive())
    }

    /// Canonical label for this period.
    pub fn label(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
            Period::AllTime => "all-time",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "yearly" => Ok(Period::Yearly),
            "all-time" | "all_time" | "alltime" => Ok(Period::AllTime),
            _ => Err(StoreError::UnknownPeriod(s.to_string())),
        }
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}
