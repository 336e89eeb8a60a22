//! Confirmed, single-attempt submission of a judge's card to the server of record.

use std::time::Duration;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::judge::{
    error::{ConfigurationError, JudgeError, SubmitError, TransportError, ValidationError},
    model::{Outcome, ScoreSheet, Tally},
    page::{JudgeIdentity, MatchRef},
    view::JudgeView,
};

/// Upper bound on one submission attempt.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);
const GENERIC_FAILURE: &str = "Failed to submit card.";

/// JSON body of `POST <submitUrl>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitCardBody {
    pub match_id: String,
    pub judge_name: String,
    /// Red points per category key.
    pub sliders: IndexMap<String, u32>,
}

/// Status and decoded body of a submission response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// `None` when the body was not JSON.
    pub body: Option<Value>,
}

impl TransportResponse {
    fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam used by [`SubmissionController`].
pub trait SubmitTransport: Send + Sync {
    fn post_card(
        &self,
        url: String,
        body: SubmitCardBody,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>>;
}

/// Where the submit control currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Confirming,
    Submitting,
    Succeeded,
}

/// How a submit click ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The judge declined the confirmation prompt.
    Declined,
    /// The server accepted the card; the view has been asked to reload.
    Submitted,
    /// A card already went through on this page; nothing was sent.
    AlreadySubmitted,
}

/// Drives `Idle → Confirming → Submitting → {Succeeded, Failed}` for one page.
pub struct SubmissionController<T> {
    submit_url: String,
    transport: T,
    limit: Duration,
    state: SubmissionState,
}

impl<T: SubmitTransport> SubmissionController<T> {
    /// Fails when the page was rendered without a submission endpoint.
    pub fn new(submit_url: Option<&str>, transport: T) -> Result<Self, ConfigurationError> {
        let submit_url = submit_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigurationError::MissingSubmitEndpoint)?;

        Ok(Self {
            submit_url: submit_url.to_string(),
            transport,
            limit: SUBMIT_TIMEOUT,
            state: SubmissionState::Idle,
        })
    }

    /// Override the attempt bound.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.limit = limit;
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn submit_url(&self) -> &str {
        &self.submit_url
    }

    /// Validate, confirm and send `sheet` for `judge`.
    ///
    /// On success the sheet is cleared and the view reloaded. On any failure the
    /// sheet is untouched, the status shows the error and the control is
    /// re-enabled so the judge can retry. Once a card has been accepted the
    /// controller never sends again.
    pub async fn submit<V: JudgeView>(
        &mut self,
        sheet: &mut ScoreSheet,
        judge: &JudgeIdentity,
        current: &MatchRef,
        view: &mut V,
    ) -> Result<SubmitOutcome, JudgeError> {
        if self.state == SubmissionState::Succeeded {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        if judge.is_empty() {
            let err = ValidationError::MissingJudgeName;
            view.set_status(err.user_message(), true);
            view.focus_judge_name();
            return Err(err.into());
        }

        if !sheet.is_complete() {
            let err = ValidationError::IncompleteScores;
            view.set_status(err.user_message(), true);
            return Err(err.into());
        }

        let tally = sheet.recompute();
        self.state = SubmissionState::Confirming;
        let prompt = confirmation_text(&tally, current);
        if !view.confirm(&prompt).await {
            self.state = SubmissionState::Idle;
            return Ok(SubmitOutcome::Declined);
        }

        self.state = SubmissionState::Submitting;
        view.set_submit_locked(true);
        view.set_status("Submitting...", false);

        let body = SubmitCardBody {
            match_id: current.match_id.clone(),
            judge_name: judge.name().to_string(),
            sliders: sheet.submission_sliders(),
        };

        match self.send(body).await {
            Ok(()) => {
                info!(match_id = %current.match_id, judge = judge.name(), "card submitted");
                self.state = SubmissionState::Succeeded;
                sheet.clear();
                view.set_status("Submitted. Refreshing…", false);
                view.reload();
                Ok(SubmitOutcome::Submitted)
            }
            Err(err) => {
                warn!(match_id = %current.match_id, error = %err, "card submission failed");
                self.state = SubmissionState::Idle;
                view.set_status(&err.user_message(), true);
                view.set_submit_locked(false);
                Err(err.into())
            }
        }
    }

    async fn send(&self, body: SubmitCardBody) -> Result<(), SubmitError> {
        let attempt = self.transport.post_card(self.submit_url.clone(), body);
        let response = match timeout(self.limit, attempt).await {
            Err(_) => {
                return Err(SubmitError::Timeout {
                    seconds: self.limit.as_secs(),
                });
            }
            Ok(Err(err)) => {
                warn!(error = %err, "submission transport error");
                return Err(SubmitError::Submission {
                    message: "Submission failed.".into(),
                });
            }
            Ok(Ok(response)) => response,
        };

        let embedded = response
            .body
            .as_ref()
            .and_then(|body| body.get("error"))
            .filter(|error| !error.is_null() && *error != &Value::Bool(false));
        if let Some(error) = embedded {
            let message = error
                .as_str()
                .filter(|text| !text.is_empty())
                .unwrap_or(GENERIC_FAILURE);
            return Err(SubmitError::Submission {
                message: message.to_string(),
            });
        }

        let well_formed = response.body.as_ref().is_some_and(Value::is_object);
        if !response.is_ok() || !well_formed {
            return Err(SubmitError::Submission {
                message: GENERIC_FAILURE.into(),
            });
        }

        Ok(())
    }
}

/// Prompt shown before a card leaves the device.
pub fn confirmation_text(tally: &Tally, current: &MatchRef) -> String {
    let scoreline = tally.scoreline();
    let parts = tally.breakdown_text();
    match tally.outcome {
        Some(Outcome::RedLeads) => format!(
            "{} wins {scoreline} ({parts}). Confirm submission?",
            current.red_name()
        ),
        Some(Outcome::WhiteLeads) => format!(
            "{} wins {scoreline} ({parts}). Confirm submission?",
            current.white_name()
        ),
        _ => format!("Scorecard is a draw at {scoreline} ({parts}). Confirm submission?"),
    }
}
