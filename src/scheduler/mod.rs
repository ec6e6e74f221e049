//! Job scheduler (SPEC_FULL.md §4.7).
//!
//! Workers are mapped to `(ctx, args) -> error` handlers registered by a
//! stable kind string, per the design note in SPEC_FULL.md §9; the queue
//! owns scheduling, timeouts, retries, and transactional completion.

pub mod queue;
pub mod workers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("reader error: {0}")]
    Meter(#[from] crate::meters::MeterError),

    #[error(transparent)]
    Recorder(#[from] crate::recorder::RecorderError),

    #[error(transparent)]
    Pricing(#[from] crate::pricing::PricingError),

    #[error(transparent)]
    Posting(#[from] crate::posting::PostingError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("job timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub const MEASURE_USAGE: &str = "measure-usage";
pub const POST_USAGE: &str = "post-usage";

pub const MEASURE_USAGE_CRON: &str = "1 * * * *";
pub const POST_USAGE_CRON: &str = "1 6 1 * *";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureUsageArgs {
    pub periodic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostUsageArgs {
    pub periodic: bool,
    pub as_of: DateTime<Utc>,
}
