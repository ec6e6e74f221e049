//! Period bounds (SPEC_FULL.md §4.5).

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeriodError {
    #[error("unknown billing time zone {0}")]
    UnknownZone(String),

    #[error("ambiguous or invalid local time during period computation")]
    AmbiguousLocalTime,
}

/// Computes the previous calendar month in `zone`, as a half-open range
/// `[period_start, period_end)` in UTC.
///
/// Tie-break: when `as_of` coincides exactly with a month boundary in
/// `zone`, the range is the month that *ends* at `as_of`, not the month
/// containing `as_of`.
pub fn bounds_month_prev(
    as_of: DateTime<Utc>,
    zone: &str,
) -> Result<(DateTime<Utc>, DateTime<Utc>), PeriodError> {
    let tz: Tz = zone.parse().map_err(|_| PeriodError::UnknownZone(zone.to_string()))?;
    let local = as_of.with_timezone(&tz);

    let is_month_boundary = local.date_naive().day() == 1
        && local.time() == chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap();

    let period_end_date = if is_month_boundary {
        local.date_naive()
    } else {
        first_of_month(local.date_naive())
    };

    let period_start_date = prev_month(period_end_date);

    let period_end = local_midnight(&tz, period_end_date)?;
    let period_start = local_midnight(&tz, period_start_date)?;

    Ok((period_start.with_timezone(&Utc), period_end.with_timezone(&Utc)))
}

fn first_of_month(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).expect("valid calendar date")
}

fn prev_month(d: NaiveDate) -> NaiveDate {
    if d.month() == 1 {
        NaiveDate::from_ymd_opt(d.year() - 1, 12, 1).expect("valid calendar date")
    } else {
        NaiveDate::from_ymd_opt(d.year(), d.month() - 1, 1).expect("valid calendar date")
    }
}

fn local_midnight(tz: &Tz, date: NaiveDate) -> Result<chrono::DateTime<Tz>, PeriodError> {
    date.and_hms_opt(0, 0, 0)
        .ok_or(PeriodError::AmbiguousLocalTime)?
        .and_local_timezone(*tz)
        .single()
        .ok_or(PeriodError::AmbiguousLocalTime)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn et(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        let tz: Tz = "America/New_York".parse().unwrap();
        tz.with_ymd_and_hms(y, m, d, h, mi, s).single().unwrap().with_timezone(&Utc)
    }

    #[test]
    fn bounds_boundary_1() {
        let as_of = et(2025, 2, 1, 0, 0, 0);
        let (start, end) = bounds_month_prev(as_of, "America/New_York").unwrap();
        assert_eq!(start, et(2025, 1, 1, 0, 0, 0));
        assert_eq!(end, et(2025, 2, 1, 0, 0, 0));
    }

    #[test]
    fn bounds_midmonth() {
        let as_of = et(2025, 2, 15, 0, 0, 0);
        let (start, end) = bounds_month_prev(as_of, "America/New_York").unwrap();
        assert_eq!(start, et(2025, 1, 1, 0, 0, 0));
        assert_eq!(end, et(2025, 2, 1, 0, 0, 0));
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let as_of = et(2025, 2, 1, 0, 0, 0);
        assert!(bounds_month_prev(as_of, "Not/AZone").is_err());
    }
}
