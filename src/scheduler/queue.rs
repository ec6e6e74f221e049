//! Postgres-backed job queue runtime, simplified relative to a production
//! queue like `river` but exercising the same contract: enqueue,
//! crontab-driven scheduling, per-job timeout, transactional completion.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use serde_json::Value as Json;
use tracing::{error, info, warn};

use crate::db::{jobs, Store};

use super::{MEASURE_USAGE, MEASURE_USAGE_CRON, POST_USAGE, POST_USAGE_CRON};

/// Enqueues one job row if none is currently `available`/`running` for the
/// same `(kind, queue)`.
pub async fn enqueue(store: &Store, kind: &str, args: Json) -> Result<(), sqlx::Error> {
    let mut conn = store.pool.acquire().await?;
    let enqueued = jobs::enqueue(&mut conn, kind, args, Utc::now(), 3).await?;
    if enqueued.is_none() {
        info!(kind, "job already enqueued for this queue, skipping");
    }
    Ok(())
}

/// Drives the two periodic crontab schedules, enqueueing a job each time a
/// schedule fires. Intended to run as a long-lived background task.
pub async fn run_crontab(store: Arc<Store>, shutdown: tokio::sync::watch::Receiver<bool>) {
    let measure_schedule = Schedule::from_str(MEASURE_USAGE_CRON).expect("valid crontab expression");
    let post_schedule = Schedule::from_str(POST_USAGE_CRON).expect("valid crontab expression");

    let mut shutdown = shutdown;
    loop {
        let now = Utc::now();
        let next_measure = measure_schedule.after(&now).next();
        let next_post = post_schedule.after(&now).next();

        let sleep_until = match (next_measure, next_post) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        let duration = (sleep_until - now).to_std().unwrap_or(Duration::from_secs(1));

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("crontab loop shutting down");
                    break;
                }
            }
        }

        let fire_now = Utc::now();
        if next_measure.map(|t| t <= fire_now).unwrap_or(false) {
            if let Err(e) = enqueue(&store, MEASURE_USAGE, serde_json::json!({"periodic": true})).await {
                error!(error = %e, "failed to enqueue measure-usage job");
            }
        }
        if next_post.map(|t| t <= fire_now).unwrap_or(false) {
            let args = serde_json::json!({"periodic": true, "as_of": fire_now});
            if let Err(e) = enqueue(&store, POST_USAGE, args).await {
                error!(error = %e, "failed to enqueue post-usage job");
            }
        }
    }
}

/// Claims and executes jobs of `kind` as they become available, enforcing
/// `timeout` per job. A handler error leaves the job for retry; a timeout
/// does the same. Intended to run as a long-lived background task.
pub async fn run_worker<F, Fut>(store: Arc<Store>, kind: &'static str, timeout: Duration, handler: F)
where
    F: Fn(Arc<Store>, Json, i64) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), super::WorkerError>> + Send,
{
    loop {
        let claimed = {
            let mut conn = match store.pool.acquire().await {
                Ok(c) => c,
                Err(e) => {
                    error!(error = %e, "failed to acquire connection for job claim");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };
            jobs::claim_next(&mut conn, kind).await
        };

        let job = match claimed {
            Ok(Some(job)) => job,
            Ok(None) => {
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
            Err(e) => {
                error!(error = %e, "failed to claim job");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        let job_id = job.id;
        let result = tokio::time::timeout(timeout, handler(store.clone(), job.args.clone(), job_id)).await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(job_id, error = %e, "job handler failed, will be retried");
                if let Ok(mut conn) = store.pool.acquire().await {
                    let _ = jobs::fail(&mut conn, job_id).await;
                }
            }
            Err(_) => {
                warn!(job_id, ?timeout, "job timed out, will be retried");
                if let Ok(mut conn) = store.pool.acquire().await {
                    let _ = jobs::fail(&mut conn, job_id).await;
                }
            }
        }
    }
}
