use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always `"ok"` while the server answers.
    pub status: String,
    /// Version currently published to pollers.
    pub version: u64,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(version: u64) -> Self {
        Self {
            status: "ok".to_string(),
            version,
        }
    }
}
