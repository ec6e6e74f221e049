//! App meter (SPEC_FULL.md §4.1), grounded on the original source's
//! `internal/usage/meter/cfapps.go` and `cfprocesses.go`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::platform::{parse_org_id, AppState, PlatformClient};

use super::{Measurement, Meter, MeterError};

pub const NAME: &str = "cf-apps";

pub struct AppMeter {
    platform: Arc<dyn PlatformClient>,
}

impl AppMeter {
    pub fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Meter for AppMeter {
    fn name(&self) -> &str {
        NAME
    }

    async fn read_usage(&self) -> Result<Vec<Measurement>, MeterError> {
        let spaces = self.platform.list_spaces().await?;
        let space_to_org: HashMap<&str, &str> =
            spaces.iter().map(|s| (s.id.as_str(), s.org_id.as_str())).collect();

        let apps = self.platform.list_apps().await?;
        let app_by_id: HashMap<&str, &crate::platform::App> =
            apps.iter().map(|a| (a.id.as_str(), a)).collect();

        let processes = self.platform.list_processes().await?;

        // Aggregate instances * memory_in_mb per app; processes referencing
        // an app not in the app list are silently ignored.
        let mut aggregated_mb: HashMap<&str, i64> = HashMap::new();
        for p in &processes {
            if app_by_id.contains_key(p.app_id.as_str()) {
                *aggregated_mb.entry(p.app_id.as_str()).or_insert(0) += p.instances * p.memory_in_mb;
            }
        }

        let measurements = apps
            .iter()
            .filter(|app| matches!(app.state, AppState::Started))
            .map(|app| {
                let value = *aggregated_mb.get(app.id.as_str()).unwrap_or(&0);
                let mut m = Measurement {
                    meter: NAME.to_string(),
                    org_id: None,
                    resource_kind_natural_id: String::new(),
                    resource_natural_id: app.id.clone(),
                    value,
                    errs: Vec::new(),
                };
                match space_to_org.get(app.space_id.as_str()) {
                    Some(org) => match parse_org_id(org) {
                        Ok(uuid) => m.org_id = Some(uuid),
                        Err(e) => m.push_err(e),
                    },
                    None => m.push_err("ErrSpaceNotFound"),
                }
                m
            })
            .collect();

        Ok(measurements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{mock::MockPlatformClient, App, AppState as PlatformAppState, Process, Space};

    #[tokio::test]
    async fn app_with_unknown_space_still_emits_with_blank_org_and_error() {
        let mock = MockPlatformClient {
            spaces: vec![Space { id: "space-a".into(), org_id: "not-a-uuid-but-irrelevant".into() }],
            apps: vec![App { id: "app-1".into(), space_id: "space-unknown".into(), state: PlatformAppState::Started }],
            processes: vec![Process { app_id: "app-1".into(), instances: 2, memory_in_mb: 512 }],
            ..Default::default()
        };
        let meter = AppMeter::new(Arc::new(mock));
        let measurements = meter.read_usage().await.unwrap();

        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].value, 1024);
        assert!(measurements[0].org_id.is_none());
        assert!(measurements[0].errs.iter().any(|e| e.contains("ErrSpaceNotFound")));
    }

    #[tokio::test]
    async fn orphan_process_is_silently_ignored() {
        let mock = MockPlatformClient {
            spaces: vec![Space { id: "space-a".into(), org_id: "11111111-1111-1111-1111-111111111111".into() }],
            apps: vec![App { id: "app-1".into(), space_id: "space-a".into(), state: PlatformAppState::Started }],
            processes: vec![
                Process { app_id: "app-1".into(), instances: 1, memory_in_mb: 256 },
                Process { app_id: "app-ghost".into(), instances: 5, memory_in_mb: 9999 },
            ],
            ..Default::default()
        };
        let meter = AppMeter::new(Arc::new(mock));
        let measurements = meter.read_usage().await.unwrap();

        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].value, 256);
    }

    #[tokio::test]
    async fn stopped_apps_are_skipped() {
        let mock = MockPlatformClient {
            spaces: vec![],
            apps: vec![App { id: "app-1".into(), space_id: "space-a".into(), state: PlatformAppState::Stopped }],
            processes: vec![],
            ..Default::default()
        };
        let meter = AppMeter::new(Arc::new(mock));
        let measurements = meter.read_usage().await.unwrap();
        assert!(measurements.is_empty());
    }
}
