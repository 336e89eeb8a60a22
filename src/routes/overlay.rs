use axum::{
    Json, Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};

use crate::{
    dto::judging::OverlayPayload, error::AppError, services::overlay_service, state::SharedState,
};

/// Routes backing the broadcast overlay and the robot modal.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/overlay", get(overlay))
        .route("/robot_card2/{weight_class}/{name}", get(robot_card))
}

/// Current match as shown on stream.
#[utoipa::path(
    get,
    path = "/overlay",
    tag = "overlay",
    responses((status = 200, description = "Current match or empty", body = OverlayPayload))
)]
pub async fn overlay(State(state): State<SharedState>) -> Json<OverlayPayload> {
    Json(overlay_service::overlay(&state).await)
}

/// HTML fragment describing one robot.
#[utoipa::path(
    get,
    path = "/robot_card2/{weight_class}/{name}",
    tag = "overlay",
    params(
        ("weight_class" = String, Path, description = "Weight class of the robot"),
        ("name" = String, Path, description = "Robot name, matched case-insensitively")
    ),
    responses(
        (status = 200, description = "Robot card fragment", content_type = "text/html", body = String),
        (status = 404, description = "Unknown robot")
    )
)]
pub async fn robot_card(
    State(state): State<SharedState>,
    Path((weight_class, name)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let card = overlay_service::robot_card(&state, &weight_class, &name).await?;
    Ok(Html(card))
}
