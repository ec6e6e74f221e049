//! Recorder (SPEC_FULL.md §4.3).

use sqlx::PgConnection;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::db::{measurement as measurement_queries, reading as reading_queries, reference};
use crate::meters::Measurement;

#[derive(Error, Debug)]
pub enum RecorderError {
    /// A `periodic=true` Reading already exists for this calendar hour. For
    /// periodic jobs this is translated into a success no-op by the caller;
    /// for manual requests it surfaces as-is.
    #[error("a periodic reading already exists for this hour")]
    ReadingExists,

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Persists a Reading and its Measurements, plus reference-entity upserts,
/// within the caller's transaction.
pub async fn record_reading(
    conn: &mut PgConnection,
    created_at: chrono::DateTime<chrono::Utc>,
    measurements: &[Measurement],
    periodic: bool,
) -> Result<(), RecorderError> {
    let reading = reading_queries::insert_reading(conn, created_at, periodic)
        .await?
        .ok_or(RecorderError::ReadingExists)?;

    let batches = batch_measurements(measurements);
    if batches.discarded > 0 {
        info!(discarded = batches.discarded, reading_id = reading.id, "discarded measurements with empty meter and resource id");
    }

    reference::upsert_meters(conn, &batches.meters).await?;
    reference::upsert_cf_orgs(conn, &batches.cf_orgs).await?;
    reference::upsert_resource_kinds(conn, &batches.kind_meters, &batches.kind_natural_ids).await?;
    reference::upsert_resources(
        conn,
        &batches.resource_meters,
        &batches.resource_natural_ids,
        &batches.resource_kind_natural_ids,
        &batches.resource_cf_org_ids,
    )
    .await?;
    measurement_queries::insert_measurements(
        conn,
        reading.id,
        &batches.measurement_meters,
        &batches.measurement_resource_natural_ids,
        &batches.measurement_values,
    )
    .await?;

    Ok(())
}

/// The five parallel insert batches the bulk-upsert protocol needs, plus a
/// count of rows discarded for having both `meter` and `resource_natural_id`
/// empty. Kept separate from `record_reading` so it can be unit tested
/// without a database connection.
#[derive(Debug, Default, PartialEq, Eq)]
struct MeasurementBatches {
    meters: Vec<String>,
    cf_orgs: Vec<Uuid>,
    kind_meters: Vec<String>,
    kind_natural_ids: Vec<String>,
    resource_meters: Vec<String>,
    resource_natural_ids: Vec<String>,
    resource_kind_natural_ids: Vec<String>,
    resource_cf_org_ids: Vec<Uuid>,
    measurement_meters: Vec<String>,
    measurement_resource_natural_ids: Vec<String>,
    measurement_values: Vec<i64>,
    discarded: u32,
}

fn batch_measurements(measurements: &[Measurement]) -> MeasurementBatches {
    let mut b = MeasurementBatches::default();

    for m in measurements {
        if m.meter.is_empty() && m.resource_natural_id.is_empty() {
            b.discarded += 1;
            continue;
        }

        b.meters.push(m.meter.clone());
        if let Some(org_id) = m.org_id {
            b.cf_orgs.push(org_id);
        }
        // Pushed unconditionally, even when empty: a resource row below may
        // reference this (meter, kind_natural_id) pair regardless of whether
        // the kind id is a real one, and the resource FK requires the kind
        // to already exist.
        b.kind_meters.push(m.meter.clone());
        b.kind_natural_ids.push(m.resource_kind_natural_id.clone());
        if let Some(org_id) = m.org_id {
            b.resource_meters.push(m.meter.clone());
            b.resource_natural_ids.push(m.resource_natural_id.clone());
            b.resource_kind_natural_ids.push(m.resource_kind_natural_id.clone());
            b.resource_cf_org_ids.push(org_id);
        }
        b.measurement_meters.push(m.meter.clone());
        b.measurement_resource_natural_ids.push(m.resource_natural_id.clone());
        b.measurement_values.push(m.value);
    }

    b.meters.sort();
    b.meters.dedup();
    b.cf_orgs.sort();
    b.cf_orgs.dedup();

    b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(meter: &str, resource: &str, value: i64) -> Measurement {
        Measurement {
            meter: meter.to_string(),
            org_id: None,
            resource_kind_natural_id: String::new(),
            resource_natural_id: resource.to_string(),
            value,
            errs: Vec::new(),
        }
    }

    #[test]
    fn record_partial_discards_counts_and_drops_empty_rows() {
        let mut measurements: Vec<Measurement> = (0..97).map(|i| measurement("cf-apps", &format!("app-{i}"), 10)).collect();
        measurements.extend((0..3).map(|_| measurement("", "", 0)));

        let batches = batch_measurements(&measurements);

        assert_eq!(batches.discarded, 3);
        assert_eq!(batches.measurement_meters.len(), 97);
    }

    #[test]
    fn duplicate_meter_names_are_deduplicated_for_the_upsert_batch() {
        let measurements = vec![
            measurement("cf-apps", "app-1", 1),
            measurement("cf-apps", "app-2", 1),
            measurement("cf-services", "svc-1", 1),
        ];
        let batches = batch_measurements(&measurements);
        assert_eq!(batches.meters, vec!["cf-apps".to_string(), "cf-services".to_string()]);
    }

    #[test]
    fn resource_with_empty_kind_natural_id_still_gets_a_matching_kind_row() {
        // Matches the app meter's shape: org found, but no resource kind
        // (src/meters/app.rs always leaves resource_kind_natural_id empty).
        let mut m = measurement("cf-apps", "app-1", 512);
        m.org_id = Some(Uuid::nil());

        let batches = batch_measurements(&[m]);

        assert_eq!(batches.resource_meters, vec!["cf-apps".to_string()]);
        assert_eq!(batches.resource_kind_natural_ids, vec![String::new()]);
        // The resource FK references (meter, kind_natural_id); the kind
        // batch must carry the same empty id or the upsert order breaks.
        assert_eq!(batches.kind_meters, vec!["cf-apps".to_string()]);
        assert_eq!(batches.kind_natural_ids, vec![String::new()]);
    }
}
