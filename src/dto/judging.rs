use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dto::validation::{validate_judge_name, validate_not_blank},
    judge::model::Category,
    state::judging::{
        CardWinner, Decision, JudgeCard, JudgedMatch, JudgingState, Points, RobotProfile,
        WinnerCounts, compute_match_summary,
    },
};

/// Card posted by a judge page. `sliders` carry red points per category.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitCardRequest {
    /// Match the judge was looking at; a stale id is rejected.
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_judge_name"))]
    pub judge_name: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub sliders: IndexMap<String, Value>,
}

/// Robot details supplied when a match is installed.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct RobotInput {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub elo: Option<i64>,
}

impl From<RobotInput> for RobotProfile {
    fn from(input: RobotInput) -> Self {
        Self {
            name: input.name.trim().to_string(),
            driver: input.driver,
            team: input.team,
            elo: input.elo,
        }
    }
}

/// Payload installing the match currently on the judging table.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct LoadMatchRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub weight_class: String,
    #[validate(nested)]
    pub red: RobotInput,
    #[validate(nested)]
    pub white: RobotInput,
}

/// Query string of `GET /api/judge/state`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Keep only the N most recent finished matches.
    pub history: Option<usize>,
}

/// Version information polled by every live surface.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StateMeta {
    pub version: u64,
    pub updated_at: Option<String>,
}

impl From<&JudgingState> for StateMeta {
    fn from(state: &JudgingState) -> Self {
        Self {
            version: state.version(),
            updated_at: state.updated_at().map(str::to_string),
        }
    }
}

/// A match with its aggregated judging summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchPayload {
    pub match_id: String,
    pub weight_class: String,
    pub red: String,
    pub white: String,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub judges: Vec<JudgeCard>,
    pub pending_judges: Vec<u32>,
    pub is_complete: bool,
    pub headline: String,
    pub winner: CardWinner,
    pub winner_name: Option<String>,
    pub decision: Decision,
    pub scorecard_strings: Vec<String>,
    pub counts: WinnerCounts,
}

impl MatchPayload {
    pub fn build(judged: &JudgedMatch, judge_count: u32) -> Self {
        let summary = compute_match_summary(judged, judge_count);
        Self {
            match_id: judged.match_id.clone(),
            weight_class: judged.weight_class.clone(),
            red: judged.red.clone(),
            white: judged.white.clone(),
            created_at: judged.created_at,
            completed_at: judged.completed_at,
            judges: summary.judge_cards,
            pending_judges: summary.pending_judges,
            is_complete: summary.is_complete,
            headline: summary.headline,
            winner: summary.winner,
            winner_name: summary.winner_name,
            decision: summary.decision,
            scorecard_strings: summary.scorecard_strings,
            counts: summary.counts,
        }
    }
}

/// Body of `GET /api/judge/state` and of a successful submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JudgeStatePayload {
    pub judge_count: u32,
    pub judge_labels: IndexMap<String, String>,
    pub categories: Vec<Category>,
    pub current: Option<MatchPayload>,
    pub history: Vec<MatchPayload>,
    pub meta: StateMeta,
}

/// Match shown on a judge page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageMatch {
    pub match_id: String,
    pub weight_class: String,
    pub red: RobotProfile,
    pub white: RobotProfile,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageEndpoints {
    pub submit: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageVersion {
    pub version: u64,
}

/// Everything a judge page needs to render; the shape the judging client reads.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JudgePagePayload {
    pub judge_id: u32,
    pub current: Option<PageMatch>,
    pub categories: Vec<Category>,
    pub api: PageEndpoints,
    pub meta: PageVersion,
    /// This judge's card already recorded for the current match.
    pub existing_submission: Option<JudgeCard>,
}

/// Card as shown on the overlay.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverlayCard {
    pub judge_id: u32,
    pub judge_name: String,
    pub winner: CardWinner,
    pub scoreline: String,
    pub breakdown: String,
    pub totals: Points,
    pub submitted_at: i64,
}

impl From<&JudgeCard> for OverlayCard {
    fn from(card: &JudgeCard) -> Self {
        Self {
            judge_id: card.judge_id,
            judge_name: card.judge_name.clone(),
            winner: card.winner,
            scoreline: card.scoreline.clone(),
            breakdown: card.breakdown.clone(),
            totals: card.totals,
            submitted_at: card.submitted_at,
        }
    }
}

/// Active match as announced by `GET /overlay`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActiveOverlay {
    pub match_id: String,
    pub weight_class: String,
    pub headline: String,
    pub winner: CardWinner,
    pub winner_name: Option<String>,
    pub decision: Decision,
    pub counts: WinnerCounts,
    pub is_complete: bool,
    pub pending_judges: Vec<u32>,
    pub red: RobotProfile,
    pub white: RobotProfile,
    pub judges: Vec<OverlayCard>,
    pub meta: StateMeta,
}

/// Body of `GET /overlay`, tagged by `status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OverlayPayload {
    Empty { meta: StateMeta },
    Active(Box<ActiveOverlay>),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn submit_request_tolerates_missing_fields() {
        let request: SubmitCardRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.match_id.is_none());
        assert!(request.sliders.is_empty());
        assert!(request.validate().is_err());

        let request: SubmitCardRequest = serde_json::from_value(json!({
            "match_id": "abc",
            "judge_name": "Alex",
            "sliders": {"damage": 5}
        }))
        .unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn load_request_rejects_blank_robot() {
        let request: LoadMatchRequest = serde_json::from_value(json!({
            "weight_class": "Beetleweight",
            "red": {"name": "Sawblaze"},
            "white": {"name": "  "}
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn overlay_is_tagged_by_status() {
        let empty = OverlayPayload::Empty {
            meta: StateMeta {
                version: 4,
                updated_at: None,
            },
        };
        let value = serde_json::to_value(&empty).unwrap();
        assert_eq!(value["status"], "empty");
        assert_eq!(value["meta"]["version"], 4);
    }
}
