//! In-memory `PlatformClient` test double, grounded on the original
//! source's `internal/cf/mock.go`.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{App, PlatformClient, PlatformError, Process, ServiceInstance, Space};

/// A fixed-response test double with a single failure-injection point per
/// list method, matching the stub-querier pattern used throughout the
/// original test suite.
#[derive(Default)]
pub struct MockPlatformClient {
    pub service_instances: Vec<ServiceInstance>,
    pub spaces: Vec<Space>,
    pub apps: Vec<App>,
    pub processes: Vec<Process>,
    pub fail_service_instances: Mutex<bool>,
    pub fail_spaces: Mutex<bool>,
    pub fail_apps: Mutex<bool>,
    pub fail_processes: Mutex<bool>,
}

impl MockPlatformClient {
    pub fn new() -> Self {
        Self::default()
    }
}

fn injected(flag: &Mutex<bool>) -> Result<(), PlatformError> {
    if *flag.lock().unwrap() {
        Err(PlatformError::UnexpectedResponse("injected failure".to_string()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl PlatformClient for MockPlatformClient {
    async fn list_service_instances_managed(&self) -> Result<Vec<ServiceInstance>, PlatformError> {
        injected(&self.fail_service_instances)?;
        Ok(self.service_instances.clone())
    }

    async fn list_spaces(&self) -> Result<Vec<Space>, PlatformError> {
        injected(&self.fail_spaces)?;
        Ok(self.spaces.clone())
    }

    async fn list_apps(&self) -> Result<Vec<App>, PlatformError> {
        injected(&self.fail_apps)?;
        Ok(self.apps.clone())
    }

    async fn list_processes(&self) -> Result<Vec<Process>, PlatformError> {
        injected(&self.fail_processes)?;
        Ok(self.processes.clone())
    }
}
