//! Meter capability (SPEC_FULL.md §4.1).

pub mod app;
pub mod service;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MeterError {
    #[error("upstream platform error: {0}")]
    Platform(#[from] crate::platform::PlatformError),
}

/// One sample of one resource, as produced directly by a Meter before
/// persistence. Carries its own error accumulator so that partial
/// enrichment failures (e.g. a missing space) never discard the row.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub meter: String,
    pub org_id: Option<Uuid>,
    pub resource_kind_natural_id: String,
    pub resource_natural_id: String,
    pub value: i64,
    pub errs: Vec<String>,
}

impl Measurement {
    pub fn push_err(&mut self, err: impl std::fmt::Display) {
        self.errs.push(err.to_string());
    }
}

/// A named source of Measurements.
#[async_trait]
pub trait Meter: Send + Sync {
    fn name(&self) -> &str;
    async fn read_usage(&self) -> Result<Vec<Measurement>, MeterError>;
}
