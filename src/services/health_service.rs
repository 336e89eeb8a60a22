use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload carrying the published version.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let version = state.judging().read().await.version();
    HealthResponse::ok(version)
}
