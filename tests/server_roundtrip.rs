//! End-to-end tests: the judging client talking to the in-memory server over HTTP.

use std::sync::Arc;

use bout_judge::{
    build_router,
    config::AppConfig,
    judge::{
        ChipPair, HttpClient, JudgeCommand, JudgeError, JudgeIdentity, JudgePageConfig,
        JudgePanel, JudgeView, LiveSyncPoller, LocalStateStore, OverlaySnapshot, PageHost,
        PollerConfig, ScoreMode, ScoreSheet, Side, StateSource, StepFlow, StepPageConfig,
        SubmissionController, SubmitError, SubmitOutcome, Tally, poller::PollCycle,
    },
    state::AppState,
};
use futures::{FutureExt, future::BoxFuture};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn_server(config: AppConfig) -> String {
    let app = build_router(AppState::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn install_match(base: &str) -> Value {
    reqwest::Client::new()
        .post(format!("{base}/api/match"))
        .json(&json!({
            "weight_class": "Beetleweight",
            "red": {"name": "Sawblaze", "driver": "Jamison", "team": "Sawblaze Robotics", "elo": 1200},
            "white": {"name": "Hypnotic", "driver": "Ellis", "team": "Hypno", "elo": 1100}
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn page_config(client: &HttpClient, judge_id: u32) -> JudgePageConfig {
    let value = client
        .fetch_state(format!("/api/judge/{judge_id}/page"))
        .await
        .unwrap();
    serde_json::from_value(value).unwrap()
}

#[derive(Default)]
struct AcceptingView {
    status: String,
    reloads: usize,
}

impl JudgeView for AcceptingView {
    fn set_status(&mut self, message: &str, _is_error: bool) {
        self.status = message.to_string();
    }

    fn set_submit_locked(&mut self, _locked: bool) {}

    fn focus_judge_name(&mut self) {}

    fn confirm(&mut self, _message: &str) -> BoxFuture<'static, bool> {
        futures::future::ready(true).boxed()
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }

    fn show_tally(&mut self, _tally: &Tally, _headline: &str) {}
}

struct VisibleHost;

impl PageHost for VisibleHost {
    fn reload(&self) {}
}

#[tokio::test]
async fn judge_panel_submits_a_card() {
    let base = spawn_server(AppConfig::default()).await;
    install_match(&base).await;
    let client = HttpClient::new(&base).unwrap();

    let page = page_config(&client, 2).await;
    assert_eq!(page.current.as_ref().unwrap().red.elo, Some(1200));

    let mut panel = JudgePanel::load(
        &page,
        LocalStateStore::in_memory(),
        client.clone(),
        AcceptingView::default(),
    );
    panel
        .dispatch(JudgeCommand::NameChanged("Alex".into()))
        .await
        .unwrap();
    panel
        .dispatch(JudgeCommand::SliderMoved {
            key: "damage".into(),
            white: 2,
        })
        .await
        .unwrap();

    let outcome = panel.dispatch(JudgeCommand::Submit).await.unwrap();
    assert_eq!(outcome, Some(SubmitOutcome::Submitted));
    assert_eq!(panel.view().reloads, 1);

    let state = client.fetch_state("/api/judge/state".into()).await.unwrap();
    let card = &state["current"]["judges"][0];
    assert_eq!(card["judge_id"], 2);
    assert_eq!(card["judge_name"], "Alex");
    assert_eq!(card["sliders"]["damage"], 6);
    assert_eq!(state["current"]["pending_judges"], json!([1, 3]));
    assert_eq!(state["meta"]["version"], 2);

    let reloaded = page_config(&client, 2).await;
    let recorded = reloaded.existing_submission.unwrap();
    assert_eq!(recorded.judge_name, "Alex");
    assert_eq!(recorded.scoreline, state["current"]["judges"][0]["scoreline"]);
}

#[tokio::test]
async fn accepted_card_is_not_overwritten_by_a_second_submit() {
    let base = spawn_server(AppConfig::default()).await;
    install_match(&base).await;
    let client = HttpClient::new(&base).unwrap();
    let page = page_config(&client, 1).await;

    let store = LocalStateStore::in_memory();
    store.save_judge_name("Robin");
    let mut panel = JudgePanel::load(&page, store, client.clone(), AcceptingView::default());
    for key in ["damage", "aggression", "control"] {
        panel
            .dispatch(JudgeCommand::SliderMoved {
                key: key.into(),
                white: 0,
            })
            .await
            .unwrap();
    }

    let first = panel.dispatch(JudgeCommand::Submit).await.unwrap();
    assert_eq!(first, Some(SubmitOutcome::Submitted));
    let second = panel.dispatch(JudgeCommand::Submit).await.unwrap();
    assert_eq!(second, Some(SubmitOutcome::AlreadySubmitted));

    let state = client.fetch_state("/api/judge/state".into()).await.unwrap();
    let card = &state["current"]["judges"][0];
    assert_eq!(card["sliders"], json!({"damage": 8, "aggression": 5, "control": 6}));
    assert_eq!(card["scoreline"], "19-0");
    assert_eq!(card["winner"], "red");
    assert_eq!(state["meta"]["version"], 2);
}

#[tokio::test]
async fn stale_match_and_missing_name_are_reported() {
    let base = spawn_server(AppConfig::default()).await;
    install_match(&base).await;
    let client = HttpClient::new(&base).unwrap();

    let raw = reqwest::Client::new()
        .post(format!("{base}/api/judge/1/submit"))
        .json(&json!({"judge_name": "   ", "sliders": {}}))
        .send()
        .await
        .unwrap();
    assert_eq!(raw.status().as_u16(), 400);
    let body: Value = raw.json().await.unwrap();
    assert_eq!(body["error"], "Judge name required");

    let page = page_config(&client, 1).await;
    let mut stale = page.current.clone().unwrap();
    stale.match_id = "stale".into();

    let mut controller = SubmissionController::new(page.api.submit.as_deref(), client).unwrap();
    let mut sheet = ScoreSheet::new(ScoreMode::Complementary, page.categories.clone());
    for category in &page.categories {
        sheet.set_score(&category.key, 3, Side::White);
    }
    let mut view = AcceptingView::default();

    let err = controller
        .submit(&mut sheet, &JudgeIdentity::new("Alex"), &stale, &mut view)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JudgeError::Submit(SubmitError::Submission { ref message }) if message == "Match has changed"
    ));
    assert_eq!(view.status, "Match has changed");
    assert!(sheet.is_scored("damage"));
}

#[tokio::test]
async fn unknown_judge_is_not_found() {
    let base = spawn_server(AppConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/judge/7/submit"))
        .json(&json!({"judge_name": "Alex"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn poller_follows_server_versions() {
    let base = spawn_server(AppConfig::default()).await;
    let client = HttpClient::new(&base).unwrap();
    let updates = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = Arc::clone(&updates);

    let mut poller = LiveSyncPoller::new(
        PollerConfig::new("/api/judge/state"),
        client,
        Arc::new(VisibleHost),
    )
    .with_handler(move |update| seen.lock().unwrap().push(update.version));

    assert_eq!(poller.poll_once().await, PollCycle::Unchanged);

    install_match(&base).await;
    assert_eq!(
        poller.poll_once().await,
        PollCycle::Updated {
            version: 1,
            previous_version: 0
        }
    );
    assert_eq!(poller.poll_once().await, PollCycle::Unchanged);
    assert_eq!(*updates.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn poller_tolerates_a_missing_endpoint() {
    let base = spawn_server(AppConfig::default()).await;
    let client = HttpClient::new(&base).unwrap();
    let mut poller = LiveSyncPoller::new(
        PollerConfig::new("/does-not-exist"),
        client,
        Arc::new(VisibleHost),
    );
    assert_eq!(poller.poll_once().await, PollCycle::Failed);
    assert_eq!(poller.current_version(), 0);
}

#[tokio::test]
async fn step_flow_posts_the_legacy_form() {
    let base = spawn_server(AppConfig::default()).await;
    install_match(&base).await;
    let client = HttpClient::new(&base).unwrap();

    let overlay = client.fetch_state("/overlay".into()).await.unwrap();
    let snapshot = OverlaySnapshot::from_value(&overlay).unwrap();
    let OverlaySnapshot::Active(current) = &snapshot else {
        panic!("expected an active overlay");
    };
    assert_eq!(current.version, Some(1));

    let steps: StepPageConfig =
        serde_json::from_value(client.fetch_state("/api/steps".into()).await.unwrap()).unwrap();
    let mut flow = StepFlow::from_page(&steps);
    let panel = flow.load_match(&snapshot);
    assert_eq!(panel.red_name, "Sawblaze");

    for (key, chip) in [
        ("aggr", ChipPair { red: 2, white: 1 }),
        ("ctrl", ChipPair { red: 2, white: 1 }),
        ("dmg", ChipPair { red: 1, white: 4 }),
    ] {
        flow.select_chip(key, chip);
        flow.advance().unwrap();
    }
    let form = flow.submit_form().unwrap();
    assert_eq!(form.result, "White wins JD");

    let status = client
        .submit_legacy_form(&steps.api.submit, &form)
        .await
        .unwrap();
    assert_eq!(status, 200);

    let state = client.fetch_state("/api/judge/state".into()).await.unwrap();
    assert_eq!(state["meta"]["version"], 2);
}

#[tokio::test]
async fn robot_cards_render_or_degrade() {
    let base = spawn_server(AppConfig::default()).await;
    install_match(&base).await;
    let client = HttpClient::new(&base).unwrap();

    let card = client.fetch_robot_card("Beetleweight", "hypnotic").await;
    assert!(card.contains("<h3>Hypnotic</h3>"));
    assert!(card.contains("Driver: Ellis"));

    let missing = client.fetch_robot_card("Beetleweight", "Ghost Bot").await;
    assert!(missing.contains("Could not load robot card"));
    assert!(missing.contains("Not found (404)"));
}

#[tokio::test]
async fn healthcheck_reports_version() {
    let base = spawn_server(AppConfig::default()).await;
    let body: Value = reqwest::get(format!("{base}/healthcheck"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "ok", "version": 0}));
}
