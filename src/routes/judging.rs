use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::judging::{
        HistoryQuery, JudgePagePayload, JudgeStatePayload, LoadMatchRequest, MatchPayload,
        SubmitCardRequest,
    },
    error::AppError,
    services::judging_service,
    state::SharedState,
};

/// Routes used by judge pages and the live judging panel.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/judge/state", get(judge_state))
        .route("/api/judge/{judge_id}/submit", post(submit_card))
        .route("/api/judge/{judge_id}/page", get(judge_page))
        .route("/api/match", post(load_match))
}

/// Record a judge card against the current match.
#[utoipa::path(
    post,
    path = "/api/judge/{judge_id}/submit",
    tag = "judging",
    params(("judge_id" = u32, Path, description = "Judge seat, starting at 1")),
    request_body = SubmitCardRequest,
    responses(
        (status = 200, description = "Card recorded", body = JudgeStatePayload),
        (status = 400, description = "Judge name missing or no active match"),
        (status = 404, description = "Unknown judge"),
        (status = 409, description = "Match has changed")
    )
)]
pub async fn submit_card(
    State(state): State<SharedState>,
    Path(judge_id): Path<u32>,
    Json(payload): Json<SubmitCardRequest>,
) -> Result<Json<JudgeStatePayload>, AppError> {
    payload.validate()?;
    let body = judging_service::submit_card(&state, judge_id, payload).await?;
    Ok(Json(body))
}

/// Versioned judging state polled by live surfaces.
#[utoipa::path(
    get,
    path = "/api/judge/state",
    tag = "judging",
    params(HistoryQuery),
    responses((status = 200, description = "Current judging state", body = JudgeStatePayload))
)]
pub async fn judge_state(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Json<JudgeStatePayload> {
    Json(judging_service::state_payload(&state, query.history).await)
}

/// Page configuration for one judge seat.
#[utoipa::path(
    get,
    path = "/api/judge/{judge_id}/page",
    tag = "judging",
    params(("judge_id" = u32, Path, description = "Judge seat, starting at 1")),
    responses(
        (status = 200, description = "Judge page configuration", body = JudgePagePayload),
        (status = 404, description = "Unknown judge")
    )
)]
pub async fn judge_page(
    State(state): State<SharedState>,
    Path(judge_id): Path<u32>,
) -> Result<Json<JudgePagePayload>, AppError> {
    let page = judging_service::judge_page(&state, judge_id).await?;
    Ok(Json(page))
}

/// Install the match on the judging table.
#[utoipa::path(
    post,
    path = "/api/match",
    tag = "judging",
    request_body = LoadMatchRequest,
    responses(
        (status = 200, description = "Match installed", body = MatchPayload),
        (status = 400, description = "Invalid match")
    )
)]
pub async fn load_match(
    State(state): State<SharedState>,
    Json(payload): Json<LoadMatchRequest>,
) -> Result<Json<MatchPayload>, AppError> {
    payload.validate()?;
    let installed = judging_service::load_match(&state, payload).await?;
    Ok(Json(installed))
}
