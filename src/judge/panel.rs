//! Slider judging page: commands from the view are dispatched here.

use tracing::info;

use crate::judge::{
    error::{ConfigurationError, JudgeError},
    local_store::LocalStateStore,
    model::{Outcome, ScoreMode, ScoreSheet, Side, Tally},
    page::{JudgeIdentity, JudgePageConfig, MatchRef},
    submission::{SubmissionController, SubmitOutcome, SubmitTransport},
    view::JudgeView,
};

/// User input the slider page produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeCommand {
    /// A slider moved; sliders carry white points.
    SliderMoved { key: String, white: i64 },
    NameChanged(String),
    Submit,
}

/// State of one open judge page.
pub struct JudgePanel<T, V> {
    sheet: ScoreSheet,
    store: LocalStateStore,
    current: Option<MatchRef>,
    controller: Result<SubmissionController<T>, ConfigurationError>,
    judge_name: String,
    view: V,
}

impl<T: SubmitTransport, V: JudgeView> JudgePanel<T, V> {
    /// Set the page up from the host configuration.
    ///
    /// Without an active match or a submit endpoint the submit control stays
    /// disabled for the lifetime of the page. Otherwise sliders are restored
    /// from the local store, defaulting to an even split.
    pub fn load(page: &JudgePageConfig, store: LocalStateStore, transport: T, view: V) -> Self {
        let controller = match page.current {
            None => Err(ConfigurationError::NoActiveMatch),
            Some(_) => SubmissionController::new(page.api.submit.as_deref(), transport),
        };

        let mut panel = Self {
            sheet: ScoreSheet::new(ScoreMode::Complementary, page.categories.iter().cloned()),
            judge_name: store.judge_name().unwrap_or_default(),
            store,
            current: page.current.clone(),
            controller,
            view,
        };

        if let Err(err) = &panel.controller {
            info!(reason = %err, "judge submission disabled for this page");
            panel.view.set_submit_locked(true);
            panel.view.set_status(err.user_message(), false);
            return panel;
        }

        let restored: Vec<(String, u32)> = panel
            .sheet
            .categories()
            .map(|category| {
                let white = panel
                    .store
                    .slider(&category.key, category.max)
                    .unwrap_or(category.max / 2);
                (category.key.clone(), white)
            })
            .collect();
        for (key, white) in restored {
            panel.sheet.set_score(&key, i64::from(white), Side::White);
        }
        panel.render();
        if let Some(card) = &page.existing_submission {
            let message = format!("Card recorded for {}: {}", card.judge_name, card.scoreline);
            panel.view.set_status(&message, false);
        }
        panel
    }

    pub fn sheet(&self) -> &ScoreSheet {
        &self.sheet
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn judge_name(&self) -> &str {
        &self.judge_name
    }

    /// Whether the submit control is usable on this page.
    pub fn is_enabled(&self) -> bool {
        self.controller.is_ok()
    }

    /// Apply one command. Only `Submit` suspends.
    pub async fn dispatch(
        &mut self,
        command: JudgeCommand,
    ) -> Result<Option<SubmitOutcome>, JudgeError> {
        match command {
            JudgeCommand::SliderMoved { key, white } => {
                if self.sheet.set_score(&key, white, Side::White) {
                    self.render();
                }
                Ok(None)
            }
            JudgeCommand::NameChanged(name) => {
                self.view.set_status("", false);
                self.judge_name = name.trim().to_string();
                self.store.save_judge_name(&name);
                Ok(None)
            }
            JudgeCommand::Submit => {
                let controller = self.controller.as_mut().map_err(|err| err.clone())?;
                let current = self
                    .current
                    .as_ref()
                    .ok_or(ConfigurationError::NoActiveMatch)?;
                let judge = JudgeIdentity::new(&self.judge_name);
                controller
                    .submit(&mut self.sheet, &judge, current, &mut self.view)
                    .await
                    .map(Some)
            }
        }
    }

    /// Persist slider positions and repaint totals.
    fn render(&mut self) -> Tally {
        let tally = self.sheet.recompute();
        for line in &tally.breakdown {
            self.store.save_slider(&line.key, line.white);
        }
        let headline = match &self.current {
            Some(current) => leader_headline(&tally, current.red_name(), current.white_name()),
            None => leader_headline(&tally, "Red", "White"),
        };
        self.view.show_tally(&tally, &headline);
        tally
    }
}

/// `"<red> leads 11-9"`, `"<white> leads 9-7"` or `"Draw 5-5"`.
pub fn leader_headline(tally: &Tally, red_name: &str, white_name: &str) -> String {
    let (red, white) = (tally.total_red, tally.total_white);
    match tally.outcome {
        Some(Outcome::RedLeads) => format!("{red_name} leads {red}-{white}"),
        Some(Outcome::WhiteLeads) => format!("{white_name} leads {white}-{red}"),
        _ => format!("Draw {red}-{white}"),
    }
}
