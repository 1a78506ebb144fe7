use std::sync::Arc;

use chrono::Utc;
use poem_openapi::{Object, OpenApi, payload::Json};
use serde::{Deserialize, Serialize};

use business::domain::identification::use_cases::identify::IdentifyUseCase;

use crate::api::tags::ApiTags;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct HealthCheckResponse {
    /// Service status
    pub status: String,
    /// Current server timestamp
    pub timestamp: String,
    /// Service version
    pub version: String,
    /// Short form of the identification pipeline state, e.g. "idle"
    pub pipeline: String,
}

/// Health API for liveness probes and monitoring.
pub struct Api {
    identify_use_case: Arc<dyn IdentifyUseCase>,
}

impl Api {
    pub fn new(identify_use_case: Arc<dyn IdentifyUseCase>) -> Self {
        Self { identify_use_case }
    }
}

#[OpenApi]
impl Api {
    /// Health check endpoint
    ///
    /// Returns the current status of the service. Does not touch the
    /// recognition service.
    ///
    /// ## Response
    /// - `status`: "healthy" if service is running
    /// - `timestamp`: Current server timestamp in ISO 8601 format
    /// - `version`: Service version from Cargo.toml
    /// - `pipeline`: Current identification state
    #[oai(path = "/health", method = "get", tag = "ApiTags::Health")]
    async fn health_check(&self) -> Json<HealthCheckResponse> {
        Json(HealthCheckResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pipeline: self.identify_use_case.current_state().to_string(),
        })
    }
}
