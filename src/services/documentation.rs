use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the judging server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::judging::submit_card,
        crate::routes::judging::judge_state,
        crate::routes::judging::judge_page,
        crate::routes::judging::load_match,
        crate::routes::overlay::overlay,
        crate::routes::overlay::robot_card,
        crate::routes::legacy::step_page,
        crate::routes::legacy::submit_match,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::judging::SubmitCardRequest,
            crate::dto::judging::LoadMatchRequest,
            crate::dto::judging::RobotInput,
            crate::dto::judging::JudgeStatePayload,
            crate::dto::judging::JudgePagePayload,
            crate::dto::judging::MatchPayload,
            crate::dto::judging::OverlayPayload,
            crate::dto::judging::StateMeta,
            crate::dto::legacy::StepPagePayload,
            crate::judge::model::Category,
            crate::state::judging::JudgeCard,
            crate::state::judging::LegacyResult,
            crate::state::judging::RobotProfile,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "judging", description = "Judge cards and the versioned judging state"),
        (name = "overlay", description = "Broadcast overlay and robot cards"),
        (name = "legacy", description = "Multi-step chip page and its form submission"),
    )
)]
pub struct ApiDoc;
