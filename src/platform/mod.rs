//! Upstream platform client capability (SPEC_FULL.md §1, §6).
//!
//! A trait abstraction over the Cloud Foundry-like control plane, with a
//! real OAuth2-backed HTTP implementation and an in-memory test double in
//! the style of the original `internal/cf` package's
//! `MockServiceInstanceClient`/`MockSpaceClient`.

pub mod http;
pub mod mock;
pub mod oauth2;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("oauth2 token request failed: {0}")]
    Auth(String),

    #[error("upstream returned an unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub id: String,
    pub space_id: String,
    pub service_plan_id: String,
    /// `None` for user-provided instances, which are filtered at the
    /// query-parameter level and must never reach this struct.
    pub managed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub id: String,
    pub org_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub id: String,
    pub space_id: String,
    pub state: AppState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Started,
    Stopped,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub app_id: String,
    pub instances: i64,
    pub memory_in_mb: i64,
}

/// Capability interface the Meters depend on. The real implementation talks
/// to the upstream REST API; tests substitute [`mock::MockPlatformClient`].
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn list_service_instances_managed(&self) -> Result<Vec<ServiceInstance>, PlatformError>;
    async fn list_spaces(&self) -> Result<Vec<Space>, PlatformError>;
    async fn list_apps(&self) -> Result<Vec<App>, PlatformError>;
    async fn list_processes(&self) -> Result<Vec<Process>, PlatformError>;
}

/// Parses an opaque identifier into a [`Uuid`] when the upstream platform's
/// ids are GUIDs (CFOrg ids). Meters that key resources by non-UUID natural
/// ids never call this.
pub fn parse_org_id(raw: &str) -> Result<Uuid, PlatformError> {
    Uuid::parse_str(raw).map_err(|e| PlatformError::UnexpectedResponse(e.to_string()))
}
