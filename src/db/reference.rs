//! Reference-entity bulk upserts (SPEC_FULL.md §4.3).
//!
//! Parallel-array `UNNEST` inserts, ported from the original service's
//! `resource.sql.go`/`cf_org.sql.go` bulk-upsert queries. Each statement is
//! `INSERT ... ON CONFLICT DO NOTHING` keyed on the referenced entity's
//! natural primary key, so concurrent recorders never race each other.

use sqlx::PgConnection;
use uuid::Uuid;

pub async fn upsert_meters(conn: &mut PgConnection, names: &[String]) -> Result<(), sqlx::Error> {
    if names.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO meter (name)
        SELECT * FROM UNNEST($1::text[])
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(names)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn upsert_cf_orgs(conn: &mut PgConnection, ids: &[Uuid]) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO cf_org (id)
        SELECT * FROM UNNEST($1::uuid[])
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(ids)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn upsert_resource_kinds(
    conn: &mut PgConnection,
    meters: &[String],
    natural_ids: &[String],
) -> Result<(), sqlx::Error> {
    if meters.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO resource_kind (meter, natural_id)
        SELECT * FROM UNNEST($1::text[], $2::text[])
        ON CONFLICT (meter, natural_id) DO NOTHING
        "#,
    )
    .bind(meters)
    .bind(natural_ids)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn upsert_resources(
    conn: &mut PgConnection,
    meters: &[String],
    natural_ids: &[String],
    kind_natural_ids: &[String],
    cf_org_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    if meters.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO resource (meter, natural_id, kind_natural_id, cf_org_id)
        SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::uuid[])
        ON CONFLICT (meter, natural_id) DO NOTHING
        "#,
    )
    .bind(meters)
    .bind(natural_ids)
    .bind(kind_natural_ids)
    .bind(cf_org_ids)
    .execute(conn)
    .await?;
    Ok(())
}
