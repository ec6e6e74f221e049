//! Reading queries (SPEC_FULL.md §3, §4.3).

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::domain::Reading;

/// Inserts a Reading. When `periodic` is true, conflicts against
/// `reading_periodic_hour_idx` (one periodic reading per calendar hour) are
/// resolved with `ON CONFLICT ... DO NOTHING`, so a collision inserts no row
/// and returns `Ok(None)` atomically rather than racing a separate read; the
/// caller translates that into the `ReadingExists` sentinel.
pub async fn insert_reading(
    conn: &mut PgConnection,
    created_at: DateTime<Utc>,
    periodic: bool,
) -> Result<Option<Reading>, sqlx::Error> {
    sqlx::query_as::<_, Reading>(
        r#"
        INSERT INTO reading (created_at, periodic)
        VALUES ($1, $2)
        ON CONFLICT (date_trunc('hour', created_at)) WHERE periodic DO NOTHING
        RETURNING id, created_at, periodic
        "#,
    )
    .bind(created_at)
    .bind(periodic)
    .fetch_optional(conn)
    .await
}
