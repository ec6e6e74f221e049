//! Posting engine (SPEC_FULL.md §4.6).

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::db::ledger::{aggregate_customer_usage, post_transaction};
use crate::period::{bounds_month_prev, PeriodError};

#[derive(thiserror::Error, Debug)]
pub enum PostingError {
    #[error("period bounds error: {0}")]
    Period(#[from] PeriodError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedCustomer {
    pub customer_id: i64,
    pub total_microcredits: i64,
}

/// Aggregates priced Measurements per customer over the previous calendar
/// month and writes one balanced Transaction per customer with a non-zero
/// total. Returns the list of posted customers.
pub async fn post_usage(
    conn: &mut PgConnection,
    as_of: DateTime<Utc>,
    zone: &str,
) -> Result<Vec<PostedCustomer>, PostingError> {
    let (period_start, period_end) = bounds_month_prev(as_of, zone)?;
    let totals = aggregate_customer_usage(conn, period_start, period_end).await?;

    let description = format!(
        "Monthly usage {}--{}",
        period_start.date_naive(),
        period_end.date_naive()
    );

    let mut posted = Vec::with_capacity(totals.len());
    for total in totals {
        post_transaction(
            conn,
            total.customer_id,
            period_end,
            &description,
            period_end,
            total.total_microcredits,
        )
        .await?;
        posted.push(PostedCustomer {
            customer_id: total.customer_id,
            total_microcredits: total.total_microcredits,
        });
    }

    Ok(posted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn description_formats_as_iso_date_range() {
        let period_start = chrono::Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let period_end = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let description = format!(
            "Monthly usage {}--{}",
            period_start.date_naive(),
            period_end.date_naive()
        );
        assert_eq!(description, "Monthly usage 2025-02-01--2025-03-01");
    }
}
