//! The two periodic job handlers (SPEC_FULL.md §4.7 worker-model
//! pseudocode).

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::info;

use crate::db::{jobs, Store};
use crate::meters::Meter;
use crate::reader::Reader;
use crate::recorder::{record_reading, RecorderError};

use super::{MeasureUsageArgs, PostUsageArgs, WorkerError};

/// ```text
/// begin tx
///   reading ← Reader.read(ctx)
///   Recorder.record_reading(ctx, …, reading, job.args.periodic)
///     → if error is ReadingExists and job is periodic: proceed (treat as success)
///     → if other error: return error (tx aborts)
///   JobComplete(tx, job)
/// commit
/// ```
pub async fn measure_usage_worker(
    store: Arc<Store>,
    args: Json,
    job_id: i64,
    meters: Arc<Vec<Box<dyn Meter>>>,
) -> Result<(), WorkerError> {
    let args: MeasureUsageArgs = serde_json::from_value(args).unwrap_or(MeasureUsageArgs { periodic: true });

    let reader = Reader::from_shared(meters);
    let reading = reader.read().await;
    if !reading.errors.is_empty() {
        for e in &reading.errors {
            tracing::warn!(error = %e, "meter returned a top-level error; continuing with partial data");
        }
    }

    let mut tx = store.pool.begin().await?;

    let record_result = record_reading(&mut tx, reading.created_at, &reading.measurements, args.periodic).await;
    match record_result {
        Ok(()) => {}
        Err(RecorderError::ReadingExists) if args.periodic => {
            info!(job_id, "reading already exists for this hour, treating as success");
        }
        Err(e) => return Err(e.into()),
    }

    jobs::complete(&mut tx, job_id).await?;
    tx.commit().await?;
    Ok(())
}

/// ```text
/// begin tx
///   Pricing.update_measurement_microcredits(ctx, job.args.as_of)
///   Posting.post_usage(ctx, job.args.as_of)
///   JobComplete(tx, job)
/// commit
/// ```
pub async fn post_usage_worker(
    store: Arc<Store>,
    args: Json,
    job_id: i64,
    billing_timezone: Arc<str>,
) -> Result<(), WorkerError> {
    let args: PostUsageArgs = serde_json::from_value(args).map_err(|e| {
        WorkerError::Db(sqlx::Error::Decode(Box::new(e)))
    })?;

    let mut tx = store.pool.begin().await?;

    let rows_priced = crate::pricing::update_measurement_microcredits_for_period(&mut tx, args.as_of, &billing_timezone).await?;
    info!(job_id, rows_priced, "priced measurements for the closed period");

    let posted = crate::posting::post_usage(&mut tx, args.as_of, &billing_timezone).await?;
    info!(job_id, customers_posted = posted.len(), "posted usage transactions");

    jobs::complete(&mut tx, job_id).await?;
    tx.commit().await?;
    Ok(())
}
