//! Service meter (SPEC_FULL.md §4.1), grounded on the original source's
//! `internal/usage/meter/cfservices.go`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::platform::{parse_org_id, PlatformClient};

use super::{Measurement, Meter, MeterError};

pub const NAME: &str = "cf-services";

pub struct ServiceMeter {
    platform: Arc<dyn PlatformClient>,
}

impl ServiceMeter {
    pub fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Meter for ServiceMeter {
    fn name(&self) -> &str {
        NAME
    }

    async fn read_usage(&self) -> Result<Vec<Measurement>, MeterError> {
        let spaces = self.platform.list_spaces().await?;
        let space_to_org: HashMap<&str, &str> =
            spaces.iter().map(|s| (s.id.as_str(), s.org_id.as_str())).collect();

        let instances = self.platform.list_service_instances_managed().await?;

        let measurements = instances
            .into_iter()
            .map(|instance| {
                let mut m = Measurement {
                    meter: NAME.to_string(),
                    org_id: None,
                    resource_kind_natural_id: instance.service_plan_id.clone(),
                    resource_natural_id: instance.id.clone(),
                    value: 1,
                    errs: Vec::new(),
                };
                match space_to_org.get(instance.space_id.as_str()) {
                    Some(org) => match parse_org_id(org) {
                        Ok(uuid) => m.org_id = Some(uuid),
                        Err(e) => m.push_err(e),
                    },
                    None => m.push_err("space not found for service instance"),
                }
                m
            })
            .collect();

        Ok(measurements)
    }
}
