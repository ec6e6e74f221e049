//! Crate-wide error aggregation.
//!
//! Each module defines its own `thiserror` error enum scoped to its
//! responsibility (see `db::DbError`, `meters::MeterError`,
//! `scheduler::WorkerError`, ...). This module only aggregates them behind
//! a single type for the binary boundary, so `main` has one error type to
//! match on for the exit-code contract in SPEC_FULL.md §6.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DbError;
use crate::recorder::RecorderError;
use crate::scheduler::WorkerError;

/// Top-level application error.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
