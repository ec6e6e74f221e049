//! Real HTTP-backed `PlatformClient` implementation.
//!
//! Deliberately pragmatic: it performs the OAuth2 client-credentials dance
//! and the four list operations §6 names, without reproducing the entire
//! upstream REST API surface.

use async_trait::async_trait;
use serde::Deserialize;

use super::oauth2::TokenProvider;
use super::{App, AppState, PlatformClient, PlatformError, Process, ServiceInstance, Space};

pub struct HttpPlatformClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
}

impl HttpPlatformClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenProvider) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), tokens }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, PlatformError> {
        let token = self.tokens.token().await?;
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[derive(Deserialize)]
struct ServiceInstanceDto {
    guid: String,
    space_guid: String,
    service_plan_guid: String,
}

#[derive(Deserialize)]
struct SpaceDto {
    guid: String,
    organization_guid: String,
}

#[derive(Deserialize)]
struct AppDto {
    guid: String,
    space_guid: String,
    state: String,
}

#[derive(Deserialize)]
struct ProcessDto {
    app_guid: String,
    instances: i64,
    memory_in_mb: i64,
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn list_service_instances_managed(&self) -> Result<Vec<ServiceInstance>, PlatformError> {
        let dtos: Vec<ServiceInstanceDto> = self
            .get("/v3/service_instances?type=managed")
            .await?;
        Ok(dtos
            .into_iter()
            .map(|d| ServiceInstance {
                id: d.guid,
                space_id: d.space_guid,
                service_plan_id: d.service_plan_guid,
                managed: true,
            })
            .collect())
    }

    async fn list_spaces(&self) -> Result<Vec<Space>, PlatformError> {
        let dtos: Vec<SpaceDto> = self.get("/v3/spaces").await?;
        Ok(dtos.into_iter().map(|d| Space { id: d.guid, org_id: d.organization_guid }).collect())
    }

    async fn list_apps(&self) -> Result<Vec<App>, PlatformError> {
        let dtos: Vec<AppDto> = self.get("/v3/apps?include=space").await?;
        Ok(dtos
            .into_iter()
            .map(|d| App {
                id: d.guid,
                space_id: d.space_guid,
                state: match d.state.as_str() {
                    "STARTED" => AppState::Started,
                    "STOPPED" => AppState::Stopped,
                    _ => AppState::Other,
                },
            })
            .collect())
    }

    async fn list_processes(&self) -> Result<Vec<Process>, PlatformError> {
        let dtos: Vec<ProcessDto> = self.get("/v3/processes").await?;
        Ok(dtos
            .into_iter()
            .map(|d| Process { app_id: d.app_guid, instances: d.instances, memory_in_mb: d.memory_in_mb })
            .collect())
    }
}
