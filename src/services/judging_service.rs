use indexmap::IndexMap;
use tracing::info;

use crate::{
    dto::{
        judging::{
            JudgePagePayload, JudgeStatePayload, LoadMatchRequest, MatchPayload, PageEndpoints,
            PageMatch, PageVersion, StateMeta, SubmitCardRequest,
        },
        legacy::{LegacyFormInput, StepEndpoints, StepPagePayload},
    },
    error::ServiceError,
    state::{
        AppState, SharedState,
        judging::{
            JudgedMatch, JudgingState, LEGACY_RESULTS, LegacyResult, Points, RobotProfile,
            create_judge_card, roster_key, unix_now,
        },
    },
};

/// Record a judge card against the current match.
///
/// Once every judge has scored, the match moves to the front of the history.
pub async fn submit_card(
    state: &SharedState,
    judge_id: u32,
    request: SubmitCardRequest,
) -> Result<JudgeStatePayload, ServiceError> {
    ensure_known_judge(state, judge_id)?;
    let judge_name = request.judge_name.trim();
    if judge_name.is_empty() {
        return Err(ServiceError::InvalidInput("Judge name required".into()));
    }

    let judge_count = state.config().judge_count();
    let mut judging = state.judging().write().await;
    let Some(current) = judging.current.as_mut() else {
        return Err(ServiceError::InvalidInput("No active match".into()));
    };
    if let Some(match_id) = request.match_id.as_deref().filter(|id| !id.is_empty()) {
        if match_id != current.match_id {
            return Err(ServiceError::InvalidState("Match has changed".into()));
        }
    }

    let now = unix_now();
    let card = create_judge_card(
        state.config().categories(),
        judge_id,
        &request.sliders,
        judge_name,
        now,
    );
    info!(
        match_id = %current.match_id,
        judge_id,
        scoreline = %card.scoreline,
        "judge card recorded"
    );
    current.judges.insert(judge_id, card);

    if judging.finalize_if_complete(judge_count, now) {
        info!("all judges scored; match moved to history");
    }
    judging.touch();

    Ok(build_state_payload(state, &judging, None))
}

/// Versioned judging state, optionally trimming the history.
pub async fn state_payload(state: &SharedState, history_limit: Option<usize>) -> JudgeStatePayload {
    let judging = state.judging().read().await;
    build_state_payload(state, &judging, history_limit)
}

/// Configuration a judge page is rendered from.
pub async fn judge_page(state: &SharedState, judge_id: u32) -> Result<JudgePagePayload, ServiceError> {
    ensure_known_judge(state, judge_id)?;
    let judging = state.judging().read().await;
    let current = judging.current.as_ref().map(|judged| PageMatch {
        match_id: judged.match_id.clone(),
        weight_class: judged.weight_class.clone(),
        red: profile_for(state, &judged.weight_class, &judged.red),
        white: profile_for(state, &judged.weight_class, &judged.white),
    });
    let existing_submission = judging
        .current
        .as_ref()
        .and_then(|judged| judged.judges.get(&judge_id))
        .cloned();

    Ok(JudgePagePayload {
        judge_id,
        current,
        categories: state.config().categories().to_vec(),
        api: PageEndpoints {
            submit: format!("/api/judge/{judge_id}/submit"),
            state: "/api/judge/state".into(),
        },
        meta: PageVersion {
            version: judging.version(),
        },
        existing_submission,
    })
}

/// Configuration of the multi-step chip page.
pub fn step_page(state: &SharedState) -> StepPagePayload {
    StepPagePayload {
        categories: state.config().chip_categories().to_vec(),
        api: StepEndpoints {
            submit: "/submit_match".into(),
            overlay: "/overlay".into(),
        },
    }
}

/// Install the match on the judging table, dropping any unfinished one.
pub async fn load_match(
    state: &SharedState,
    request: LoadMatchRequest,
) -> Result<MatchPayload, ServiceError> {
    let LoadMatchRequest {
        weight_class,
        red,
        white,
    } = request;
    let red: RobotProfile = red.into();
    let white: RobotProfile = white.into();
    if roster_key(&weight_class, &red.name) == roster_key(&weight_class, &white.name) {
        return Err(ServiceError::InvalidInput(
            "Red and White robots must be different.".into(),
        ));
    }

    let judged = JudgedMatch::new(&weight_class, &red.name, &white.name, unix_now());
    state.register_robot(&weight_class, red);
    state.register_robot(&weight_class, white);

    let mut judging = state.judging().write().await;
    if let Some(dropped) = judging.current.replace(judged.clone()) {
        info!(match_id = %dropped.match_id, "unfinished match replaced");
    }
    judging.touch();
    info!(match_id = %judged.match_id, weight_class = %judged.weight_class, "match installed");

    Ok(MatchPayload::build(&judged, state.config().judge_count()))
}

/// Append a result from the legacy match form.
pub async fn record_legacy_result(
    state: &SharedState,
    input: LegacyFormInput,
) -> Result<LegacyResult, ServiceError> {
    let valid = !input.weight_class.is_empty()
        && !input.red.is_empty()
        && !input.white.is_empty()
        && LEGACY_RESULTS.contains(&input.result.as_str())
        && roster_key(&input.weight_class, &input.red) != roster_key(&input.weight_class, &input.white);
    if !valid {
        return Err(ServiceError::InvalidInput("Bad match input".into()));
    }

    let scores = input
        .scores
        .into_iter()
        .map(|(key, (red, white))| {
            (
                key,
                Points {
                    red: red.unwrap_or_default(),
                    white: white.unwrap_or_default(),
                },
            )
        })
        .collect();
    let result = LegacyResult {
        weight_class: input.weight_class,
        red: input.red,
        white: input.white,
        result: input.result,
        scores,
        recorded_at: unix_now(),
    };

    let mut judging = state.judging().write().await;
    judging.results.push(result.clone());
    judging.touch();
    info!(red = %result.red, white = %result.white, result = %result.result, "legacy result recorded");
    Ok(result)
}

fn ensure_known_judge(state: &AppState, judge_id: u32) -> Result<(), ServiceError> {
    if judge_id == 0 || judge_id > state.config().judge_count() {
        return Err(ServiceError::NotFound("Unknown judge".into()));
    }
    Ok(())
}

fn profile_for(state: &AppState, weight_class: &str, name: &str) -> RobotProfile {
    state
        .robot(weight_class, name)
        .map(|entry| entry.profile)
        .unwrap_or_else(|| RobotProfile::named(name))
}

fn build_state_payload(
    state: &AppState,
    judging: &JudgingState,
    history_limit: Option<usize>,
) -> JudgeStatePayload {
    let judge_count = state.config().judge_count();
    let limit = history_limit.unwrap_or(usize::MAX);
    let judge_labels: IndexMap<String, String> = (1..=judge_count)
        .map(|id| (id.to_string(), format!("Judge {id}")))
        .collect();

    JudgeStatePayload {
        judge_count,
        judge_labels,
        categories: state.config().categories().to_vec(),
        current: judging
            .current
            .as_ref()
            .map(|judged| MatchPayload::build(judged, judge_count)),
        history: judging
            .history
            .iter()
            .take(limit)
            .map(|judged| MatchPayload::build(judged, judge_count))
            .collect(),
        meta: StateMeta::from(judging),
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;
    use crate::{config::AppConfig, dto::judging::RobotInput, state::judging::Decision};

    fn robot(name: &str) -> RobotInput {
        RobotInput {
            name: name.into(),
            driver: "Driver".into(),
            team: "Team".into(),
            elo: Some(1000),
        }
    }

    fn load_request() -> LoadMatchRequest {
        LoadMatchRequest {
            weight_class: "Beetleweight".into(),
            red: robot("Sawblaze"),
            white: robot("Hypnotic"),
        }
    }

    fn card_request(match_id: Option<&str>, name: &str, damage: u32) -> SubmitCardRequest {
        let sliders: IndexMap<String, serde_json::Value> =
            serde_json::from_value(json!({"damage": damage, "aggression": 3, "control": 4}))
                .unwrap();
        SubmitCardRequest {
            match_id: match_id.map(str::to_string),
            judge_name: name.into(),
            sliders,
        }
    }

    #[tokio::test]
    async fn submit_without_match_is_rejected() {
        let state = AppState::new(AppConfig::default());
        let err = submit_card(&state, 1, card_request(None, "Alex", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref m) if m == "No active match"));
    }

    #[tokio::test]
    async fn unknown_judge_and_blank_name_are_rejected() {
        let state = AppState::new(AppConfig::default());
        load_match(&state, load_request()).await.unwrap();

        let err = submit_card(&state, 4, card_request(None, "Alex", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = submit_card(&state, 1, card_request(None, "  ", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref m) if m == "Judge name required"));
    }

    #[tokio::test]
    async fn stale_match_id_conflicts() {
        let state = AppState::new(AppConfig::default());
        load_match(&state, load_request()).await.unwrap();
        let err = submit_card(&state, 1, card_request(Some("stale"), "Alex", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(ref m) if m == "Match has changed"));
    }

    #[tokio::test]
    async fn full_panel_finalizes_match() {
        let state = AppState::new(AppConfig::default());
        let installed = load_match(&state, load_request()).await.unwrap();
        let id = installed.match_id.as_str();

        let first = submit_card(&state, 1, card_request(Some(id), "A", 8)).await.unwrap();
        let current = first.current.as_ref().unwrap();
        assert_eq!(current.pending_judges, vec![2, 3]);
        let mut version = first.meta.version;

        for judge in [2, 3] {
            let payload = submit_card(&state, judge, card_request(Some(id), "B", 8))
                .await
                .unwrap();
            assert!(payload.meta.version > version);
            version = payload.meta.version;
            if judge == 3 {
                assert!(payload.current.is_none());
                let finished = &payload.history[0];
                assert_eq!(finished.decision, Decision::Unanimous);
                assert!(finished.completed_at.is_some());
                assert!(finished.headline.starts_with("Sawblaze wins via unanimous decision"));
            }
        }
    }

    #[tokio::test]
    async fn judge_page_uses_registered_profiles() {
        let state = AppState::new(AppConfig::default());
        load_match(&state, load_request()).await.unwrap();
        let page = judge_page(&state, 2).await.unwrap();
        assert_eq!(page.api.submit, "/api/judge/2/submit");
        let current = page.current.unwrap();
        assert_eq!(current.red.elo, Some(1000));
        assert_eq!(current.white.name, "Hypnotic");
        assert_eq!(page.meta.version, 1);
        assert!(page.existing_submission.is_none());

        let match_id = current.match_id.clone();
        submit_card(&state, 2, card_request(Some(match_id.as_str()), "Alex", 8))
            .await
            .unwrap();
        let page = judge_page(&state, 2).await.unwrap();
        let card = page.existing_submission.unwrap();
        assert_eq!(card.judge_name, "Alex");
        assert_eq!(card.sliders["damage"], 8);
        assert!(judge_page(&state, 1).await.unwrap().existing_submission.is_none());
    }

    #[test]
    fn step_page_serves_chip_categories() {
        let state = AppState::new(AppConfig::default());
        let page = step_page(&state);
        let keys: Vec<&str> = page.categories.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["aggr", "ctrl", "dmg"]);
        assert_eq!(page.categories[2].max, 5);
        assert_eq!(page.api.submit, "/submit_match");
    }

    #[tokio::test]
    async fn legacy_result_requires_distinct_robots() {
        let state = AppState::new(AppConfig::default());
        let mut input = LegacyFormInput {
            weight_class: "Antweights".into(),
            red: "Pinch".into(),
            white: "pinch".into(),
            result: "Draw".into(),
            ..LegacyFormInput::default()
        };
        assert!(record_legacy_result(&state, input.clone()).await.is_err());

        input.white = "Flip".into();
        input.scores.insert("dmg".into(), (Some(3), None));
        let recorded = record_legacy_result(&state, input).await.unwrap();
        assert_eq!(recorded.scores["dmg"], Points { red: 3, white: 0 });
        assert_eq!(state.judging().read().await.version(), 1);
    }

    #[tokio::test]
    async fn history_limit_trims_payload() {
        let state = AppState::new(AppConfig::default().with_judge_count(1));
        for _ in 0..3 {
            let installed = load_match(&state, load_request()).await.unwrap();
            submit_card(&state, 1, card_request(Some(&installed.match_id), "A", 1))
                .await
                .unwrap();
        }
        assert_eq!(state_payload(&state, None).await.history.len(), 3);
        assert_eq!(state_payload(&state, Some(1)).await.history.len(), 1);
    }
}
