use axum::{
    Form, Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::legacy::{LegacyFormInput, StepPagePayload},
    error::AppError,
    services::judging_service,
    state::{SharedState, judging::LegacyResult},
};

/// Routes backing the multi-step chip page.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/steps", get(step_page))
        .route("/submit_match", post(submit_match))
}

/// Chip categories and endpoints of the multi-step page.
#[utoipa::path(
    get,
    path = "/api/steps",
    tag = "legacy",
    responses((status = 200, description = "Step page configuration", body = StepPagePayload))
)]
pub async fn step_page(State(state): State<SharedState>) -> Json<StepPagePayload> {
    Json(judging_service::step_page(&state))
}

/// Record a result posted as `application/x-www-form-urlencoded`.
#[utoipa::path(
    post,
    path = "/submit_match",
    tag = "legacy",
    request_body(
        content = String,
        content_type = "application/x-www-form-urlencoded",
        description = "wc, red, white, result and jd_<key>_r / jd_<key>_w fields"
    ),
    responses(
        (status = 200, description = "Result recorded", body = LegacyResult),
        (status = 400, description = "Bad match input")
    )
)]
pub async fn submit_match(
    State(state): State<SharedState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Json<LegacyResult>, AppError> {
    let input = LegacyFormInput::from_pairs(fields);
    let recorded = judging_service::record_legacy_result(&state, input).await?;
    Ok(Json(recorded))
}
