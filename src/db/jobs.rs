//! Job queue persistence (SPEC_FULL.md §4.7, §6).

use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use sqlx::PgConnection;

use crate::domain::{Job, DEFAULT_QUEUE};

/// Enqueues a job. Returns `Ok(None)` if an `available`/`running` job of the
/// same `(kind, queue)` already exists; the partial unique index on `job`
/// gives "at most one enqueued per queue" for free.
pub async fn enqueue(
    conn: &mut PgConnection,
    kind: &str,
    args: Json,
    scheduled_at: DateTime<Utc>,
    max_attempts: i32,
) -> Result<Option<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO job (kind, queue, args, state, scheduled_at, attempt, max_attempts)
        VALUES ($1, $2, $3, 'available', $4, 0, $5)
        ON CONFLICT DO NOTHING
        RETURNING id, kind, queue, args, state, scheduled_at, completed_at, attempt, max_attempts
        "#,
    )
    .bind(kind)
    .bind(DEFAULT_QUEUE)
    .bind(args)
    .bind(scheduled_at)
    .bind(max_attempts)
    .fetch_optional(conn)
    .await
}

/// Claims the oldest available job of the given kind, transitioning it to
/// `running` and incrementing its attempt counter.
pub async fn claim_next(conn: &mut PgConnection, kind: &str) -> Result<Option<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>(
        r#"
        UPDATE job
        SET state = 'running', attempt = attempt + 1
        WHERE id = (
            SELECT id FROM job
            WHERE kind = $1 AND state = 'available' AND scheduled_at <= now()
            ORDER BY scheduled_at
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        RETURNING id, kind, queue, args, state, scheduled_at, completed_at, attempt, max_attempts
        "#,
    )
    .bind(kind)
    .fetch_optional(conn)
    .await
}

/// Transitions a job to `completed` in the caller's transaction, so the
/// state change commits atomically with the job's own effects.
pub async fn complete(conn: &mut PgConnection, job_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(r#"UPDATE job SET state = 'completed', completed_at = now() WHERE id = $1"#)
        .bind(job_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Transitions a job back to `available` (if attempts remain) or `failed`.
pub async fn fail(conn: &mut PgConnection, job_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE job
        SET state = CASE WHEN attempt < max_attempts THEN 'available' ELSE 'failed' END
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .execute(conn)
    .await?;
    Ok(())
}
