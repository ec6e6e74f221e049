//! Core domain types (SPEC_FULL.md §3).
//!
//! Mirrors the shape of the original `internal/db/models.go` one-struct-
//! per-entity file, expanded with the account/ledger/job entities the
//! distilled spec's data model adds on top of the upstream-platform
//! reference data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A billable tenant. Created externally; immutable for the life of its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

/// An organization in the upstream platform, assigned to at most one Customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CfOrg {
    pub id: Uuid,
    pub customer_id: Option<i64>,
}

/// The two ledger account types this core requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "kebab-case")]
pub enum AccountType {
    UsageIncurred,
    UsageLiability,
}

/// A ledger account owned by exactly one Customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub customer_id: i64,
    #[sqlx(rename = "type")]
    pub account_type: AccountType,
}

/// A named source of Measurements. Key is the unique, case-sensitive `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeterRef {
    pub name: String,
}

/// A class of billable resource within a Meter, e.g. a service plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResourceKind {
    pub meter: String,
    pub natural_id: String,
}

/// A specific instance of a ResourceKind, owned by a CfOrg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resource {
    pub meter: String,
    pub natural_id: String,
    pub kind_natural_id: String,
    pub cf_org_id: Uuid,
}

/// An atomic snapshot in time: one fan-out across all registered Meters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reading {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub periodic: bool,
}

/// A single sample of one resource within one Reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Measurement {
    pub reading_id: i32,
    pub meter: String,
    pub resource_natural_id: String,
    pub value: i64,
    pub amount_microcredits: Option<i64>,
}

/// A time-bounded tariff for a `(meter, kind_natural_id)` pair. Pricing
/// lookups run as pure SQL (see `db::measurement::update_measurement_microcredits`);
/// this struct exists for admin inspection and tests, not the hot path.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Price {
    pub meter: String,
    pub kind_natural_id: String,
    pub id: i32,
    pub microcredits_per_unit: i64,
    pub unit_of_measure: String,
    pub unit: i64,
    pub valid_during: sqlx::postgres::types::PgRange<DateTime<Utc>>,
}

/// A ledger event: one Transaction owns one or more balanced Entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i32,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    #[sqlx(rename = "type")]
    pub transaction_type: String,
    pub customer_id: i64,
    /// Exclusive end of the posted period. Only set for `usage-post`
    /// transactions; backs the `(customer_id, period_end)` defense-in-depth
    /// dedup index (SPEC_FULL.md §4.6/§6).
    pub period_end: Option<DateTime<Utc>>,
}

/// A signed leg of a Transaction. `direction` is always -1 or +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Entry {
    pub transaction_id: i32,
    pub account_id: i64,
    pub direction: i16,
    pub amount_microcredits: i64,
}

pub const TRANSACTION_TYPE_USAGE_POST: &str = "usage-post";

/// The stable kind string a job handler registers against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum JobKind {
    MeasureUsage,
    PostUsage,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::MeasureUsage => "measure-usage",
            JobKind::PostUsage => "post-usage",
        }
    }
}

impl std::str::FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "measure-usage" => Ok(JobKind::MeasureUsage),
            "post-usage" => Ok(JobKind::PostUsage),
            other => Err(format!("unknown job kind {other}")),
        }
    }
}

/// Lifecycle state of a queued Job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum JobState {
    Available,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Available => "available",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

/// A row in the Postgres-backed job queue.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: i64,
    pub kind: String,
    pub queue: String,
    pub args: serde_json::Value,
    pub state: String,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub attempt: i32,
    pub max_attempts: i32,
}

pub const DEFAULT_QUEUE: &str = "default";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_direction_is_constrained_to_plus_or_minus_one() {
        let e = Entry { transaction_id: 1, account_id: 1, direction: -1, amount_microcredits: 10 };
        assert_eq!(e.direction.abs(), 1);
    }
}
