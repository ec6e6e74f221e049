//! Data access layer (SPEC_FULL.md §4.8).
//!
//! A typed query surface over `sqlx::PgPool`/`sqlx::Transaction`, one
//! function per statement, organized one file per entity. Queries use the
//! runtime `query`/`query_as` builder API rather than the `query!` macro
//! family, since there is no reachable `DATABASE_URL` at build time.

pub mod jobs;
pub mod ledger;
pub mod measurement;
pub mod reading;
pub mod reference;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database connection error: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Query(#[from] sqlx::Error),
}

/// Thin wrapper around the connection pool.
#[derive(Clone)]
pub struct Store {
    pub pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(DbError::Connect)?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, DbError> {
        Ok(self.pool.begin().await?)
    }
}
