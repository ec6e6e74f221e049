//! Measurement bulk insert and pricing update (SPEC_FULL.md §4.3, §4.4).

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

/// Bulk-inserts Measurements for one Reading. No conflict target: uniqueness
/// is only meaningful within a single Reading, and the Reading was just
/// inserted fresh by the caller.
pub async fn insert_measurements(
    conn: &mut PgConnection,
    reading_id: i32,
    meters: &[String],
    resource_natural_ids: &[String],
    values: &[i64],
) -> Result<(), sqlx::Error> {
    if meters.is_empty() {
        return Ok(());
    }
    let reading_ids = vec![reading_id; meters.len()];
    sqlx::query(
        r#"
        INSERT INTO measurement (reading_id, meter, resource_natural_id, value)
        SELECT * FROM UNNEST($1::int[], $2::text[], $3::text[], $4::bigint[])
        "#,
    )
    .bind(reading_ids)
    .bind(meters)
    .bind(resource_natural_ids)
    .bind(values)
    .execute(conn)
    .await?;
    Ok(())
}

/// Stamps `amount_microcredits` onto every Measurement in `[period_start,
/// period_end)` that is still unpriced, joining through Resource →
/// ResourceKind → the Price whose `valid_during` contains the Reading's
/// timestamp. Returns the number of rows updated.
///
/// Idempotent: a second call with the same bounds updates zero rows because
/// the `WHERE amount_microcredits IS NULL` filter excludes already-stamped
/// rows.
pub async fn update_measurement_microcredits(
    conn: &mut PgConnection,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE measurement m
        SET amount_microcredits = (m.value * p.microcredits_per_unit) / p.unit
        FROM reading r, resource res, price p
        WHERE m.reading_id = r.id
          AND res.meter = m.meter
          AND res.natural_id = m.resource_natural_id
          AND p.meter = res.meter
          AND p.kind_natural_id = res.kind_natural_id
          AND p.valid_during @> r.created_at
          AND r.created_at >= $1
          AND r.created_at < $2
          AND m.amount_microcredits IS NULL
        "#,
    )
    .bind(period_start)
    .bind(period_end)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
