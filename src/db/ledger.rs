//! Ledger queries: customers, accounts, transactions, entries (SPEC_FULL.md
//! §3, §4.6).

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::domain::{AccountType, TRANSACTION_TYPE_USAGE_POST};

/// One customer's aggregated, still-unposted usage total for a period.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CustomerTotal {
    pub customer_id: i64,
    pub total_microcredits: i64,
}

/// Groups priced Measurements in `[period_start, period_end)` by the owning
/// Customer of the Measurement's Resource's CFOrg, summing
/// `amount_microcredits`. NULL-priced rows are excluded by the join;
/// customers whose sum is not strictly positive are omitted.
pub async fn aggregate_customer_usage(
    conn: &mut PgConnection,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> Result<Vec<CustomerTotal>, sqlx::Error> {
    sqlx::query_as::<_, CustomerTotal>(
        r#"
        SELECT o.customer_id AS customer_id, SUM(m.amount_microcredits)::bigint AS total_microcredits
        FROM measurement m
        JOIN reading r ON r.id = m.reading_id
        JOIN resource res ON res.meter = m.meter AND res.natural_id = m.resource_natural_id
        JOIN cf_org o ON o.id = res.cf_org_id
        WHERE r.created_at >= $1
          AND r.created_at < $2
          AND m.amount_microcredits IS NOT NULL
          AND o.customer_id IS NOT NULL
        GROUP BY o.customer_id
        HAVING SUM(m.amount_microcredits) > 0
        "#,
    )
    .bind(period_start)
    .bind(period_end)
    .fetch_all(conn)
    .await
}

/// Resolves the account id for `(customer_id, type)`. Every Customer has
/// exactly one account of each required type, created atomically with the
/// customer row.
pub async fn account_id(
    conn: &mut PgConnection,
    customer_id: i64,
    account_type: AccountType,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) =
        sqlx::query_as(r#"SELECT id FROM account WHERE customer_id = $1 AND type = $2"#)
            .bind(customer_id)
            .bind(account_type)
            .fetch_one(conn)
            .await?;
    Ok(id)
}

/// Inserts a customer along with its two required accounts, atomically.
pub async fn create_customer(
    conn: &mut PgConnection,
    name: &str,
) -> Result<i64, sqlx::Error> {
    let (customer_id,): (i64,) =
        sqlx::query_as(r#"INSERT INTO customer (name) VALUES ($1) RETURNING id"#)
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

    sqlx::query(r#"INSERT INTO account (customer_id, type) VALUES ($1, $2), ($1, $3)"#)
        .bind(customer_id)
        .bind(AccountType::UsageIncurred)
        .bind(AccountType::UsageLiability)
        .execute(conn)
        .await?;

    Ok(customer_id)
}

/// Inserts the usage-post Transaction and its two balanced Entries.
pub async fn post_transaction(
    conn: &mut PgConnection,
    customer_id: i64,
    occurred_at: DateTime<Utc>,
    description: &str,
    period_end: DateTime<Utc>,
    total_microcredits: i64,
) -> Result<i32, sqlx::Error> {
    let (transaction_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO "transaction" (occurred_at, description, type, customer_id, period_end)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(occurred_at)
    .bind(description)
    .bind(TRANSACTION_TYPE_USAGE_POST)
    .bind(customer_id)
    .bind(period_end)
    .fetch_one(&mut *conn)
    .await?;

    let liability = account_id(conn, customer_id, AccountType::UsageLiability).await?;
    let incurred = account_id(conn, customer_id, AccountType::UsageIncurred).await?;

    sqlx::query(
        r#"
        INSERT INTO entry (transaction_id, account_id, direction, amount_microcredits)
        VALUES ($1, $2, -1, $4), ($1, $3, 1, $4)
        "#,
    )
    .bind(transaction_id)
    .bind(liability)
    .bind(incurred)
    .bind(total_microcredits)
    .execute(conn)
    .await?;

    Ok(transaction_id)
}
