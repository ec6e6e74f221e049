//! Pricing engine (SPEC_FULL.md §4.4).

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::db::measurement::update_measurement_microcredits;
use crate::period::{bounds_month_prev, PeriodError};

#[derive(thiserror::Error, Debug)]
pub enum PricingError {
    #[error("period bounds error: {0}")]
    Period(#[from] PeriodError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Stamps `amount_microcredits` onto every unpriced Measurement in the
/// previous calendar month relative to `as_of`, billing zone `zone`.
/// Returns the number of rows updated. Idempotent: a second call with the
/// same `as_of` updates zero rows.
pub async fn update_measurement_microcredits_for_period(
    conn: &mut PgConnection,
    as_of: DateTime<Utc>,
    zone: &str,
) -> Result<u64, PricingError> {
    let (period_start, period_end) = bounds_month_prev(as_of, zone)?;
    let rows = update_measurement_microcredits(conn, period_start, period_end).await?;
    Ok(rows)
}

/// Truncating-toward-zero integer pricing arithmetic, extracted as a pure
/// function so the invariant in SPEC_FULL.md §8.5 can be property-tested
/// without a database connection. The production update statement in
/// `db::measurement` performs the same arithmetic in SQL.
pub fn price_value(value: i64, microcredits_per_unit: i64, unit: i64) -> i64 {
    (value * microcredits_per_unit) / unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pricing_filter_example_from_spec() {
        assert_eq!(price_value(7, 8, 2), 28);
    }

    proptest! {
        #[test]
        fn truncates_toward_zero(value in 0i64..1_000_000, rate in 0i64..10_000, unit in 1i64..1_000) {
            let priced = price_value(value, rate, unit);
            let exact = (value as f64 * rate as f64) / unit as f64;
            prop_assert!(priced as f64 <= exact);
            prop_assert!(priced >= 0);
        }
    }
}
