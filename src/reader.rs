//! Reader (SPEC_FULL.md §4.2).

use std::sync::Arc;

use chrono::Utc;

use crate::meters::{Measurement, Meter};

/// A single fan-out across all registered Meters, stamped with one
/// wall-clock time.
pub struct ReadingResult {
    pub created_at: chrono::DateTime<Utc>,
    pub measurements: Vec<Measurement>,
    /// Accumulated top-level Meter errors. Non-empty does not mean the
    /// Reading should be discarded; the caller decides.
    pub errors: Vec<anyhow::Error>,
}

pub struct Reader {
    meters: Arc<Vec<Box<dyn Meter>>>,
}

impl Reader {
    pub fn new(meters: Vec<Box<dyn Meter>>) -> Self {
        Self { meters: Arc::new(meters) }
    }

    pub fn from_shared(meters: Arc<Vec<Box<dyn Meter>>>) -> Self {
        Self { meters }
    }

    /// Invokes each Meter sequentially in registration order, concatenating
    /// Measurements and accumulating any top-level errors. A failing Meter
    /// never stops the remaining Meters from running.
    pub async fn read(&self) -> ReadingResult {
        let created_at = Utc::now();
        let mut measurements = Vec::new();
        let mut errors = Vec::new();

        for meter in &self.meters {
            match meter.read_usage().await {
                Ok(mut batch) => measurements.append(&mut batch),
                Err(e) => errors.push(anyhow::anyhow!("meter {} failed: {e}", meter.name())),
            }
        }

        ReadingResult { created_at, measurements, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meters::MeterError;
    use async_trait::async_trait;

    struct OkMeter(&'static str, i64);
    struct FailingMeter(&'static str);

    #[async_trait]
    impl Meter for OkMeter {
        fn name(&self) -> &str {
            self.0
        }
        async fn read_usage(&self) -> Result<Vec<Measurement>, MeterError> {
            Ok(vec![Measurement {
                meter: self.0.to_string(),
                org_id: None,
                resource_kind_natural_id: String::new(),
                resource_natural_id: "r1".to_string(),
                value: self.1,
                errs: Vec::new(),
            }])
        }
    }

    #[async_trait]
    impl Meter for FailingMeter {
        fn name(&self) -> &str {
            self.0
        }
        async fn read_usage(&self) -> Result<Vec<Measurement>, MeterError> {
            Err(MeterError::Platform(crate::platform::PlatformError::UnexpectedResponse(
                "boom".to_string(),
            )))
        }
    }

    #[tokio::test]
    async fn one_failing_meter_does_not_block_the_others() {
        let reader = Reader::new(vec![
            Box::new(OkMeter("a", 1)),
            Box::new(FailingMeter("b")),
            Box::new(OkMeter("c", 2)),
        ]);
        let result = reader.read().await;

        assert_eq!(result.measurements.len(), 2);
        assert_eq!(result.measurements[0].meter, "a");
        assert_eq!(result.measurements[1].meter, "c");
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn measurements_preserve_meter_registration_order() {
        let reader = Reader::new(vec![Box::new(OkMeter("first", 1)), Box::new(OkMeter("second", 2))]);
        let result = reader.read().await;
        assert_eq!(result.measurements[0].meter, "first");
        assert_eq!(result.measurements[1].meter, "second");
    }
}
