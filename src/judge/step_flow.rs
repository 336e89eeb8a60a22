//! Slide-by-slide chip judging: one step per category, then a summary.

use tracing::debug;

use crate::judge::{
    error::ValidationError,
    model::{Category, ChipPair, Outcome, ScoreMode, ScoreSheet, Tally},
    page::{NowPanel, OverlaySnapshot, StepPageConfig},
};

/// What the current slide shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    Category(&'a Category),
    Summary,
}

/// Read-only rendering of the summary slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub total_red: u32,
    pub total_white: u32,
    /// Headline on the summary slide (`"Red Wins JD"`, `"Draw"`, `"—"`).
    pub winner: String,
    /// Value of the hidden `result` field; empty when nothing was scored.
    pub result: String,
    pub lines: Vec<SummaryLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub key: String,
    pub label: String,
    pub red: Option<u32>,
    pub white: Option<u32>,
}

impl SummaryLine {
    /// Points as displayed, with a dash for an unscored side.
    pub fn display(points: Option<u32>) -> String {
        points.map_or_else(|| "–".to_string(), |p| p.to_string())
    }
}

/// Fields of the legacy `/submit_match` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyForm {
    pub weight_class: String,
    pub red: String,
    pub white: String,
    pub result: String,
    /// `(category key, red, white)`, unscored sides as `0`.
    pub scores: Vec<(String, u32, u32)>,
}

impl LegacyForm {
    /// Ordered `name=value` pairs as the browser would post them.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("wc".to_string(), self.weight_class.clone()),
            ("red".to_string(), self.red.clone()),
            ("white".to_string(), self.white.clone()),
            ("result".to_string(), self.result.clone()),
        ];
        for (key, red, white) in &self.scores {
            fields.push((format!("jd_{key}_r"), red.to_string()));
            fields.push((format!("jd_{key}_w"), white.to_string()));
        }
        fields
    }
}

#[derive(Debug, Clone, Default)]
struct LoadedMatch {
    weight_class: String,
    red: String,
    white: String,
}

/// Sequencer over `1..=N` steps where the last step is the summary.
#[derive(Debug, Clone)]
pub struct StepFlow {
    sheet: ScoreSheet,
    current: usize,
    loaded: Option<LoadedMatch>,
    summary: Option<SummaryView>,
}

impl StepFlow {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            sheet: ScoreSheet::new(ScoreMode::Discrete, categories),
            current: 1,
            loaded: None,
            summary: None,
        }
    }

    /// Flow over the chip categories the server configured.
    pub fn from_page(page: &StepPageConfig) -> Self {
        Self::new(page.categories.iter().cloned())
    }

    /// Number of steps including the summary.
    pub fn step_count(&self) -> usize {
        self.sheet.categories().count() + 1
    }

    /// 1-based index of the current step.
    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn step(&self) -> Step<'_> {
        self.step_at(self.current)
    }

    fn step_at(&self, number: usize) -> Step<'_> {
        match self.sheet.categories().nth(number.saturating_sub(1)) {
            Some(category) => Step::Category(category),
            None => Step::Summary,
        }
    }

    pub fn sheet(&self) -> &ScoreSheet {
        &self.sheet
    }

    pub fn summary(&self) -> Option<&SummaryView> {
        self.summary.as_ref()
    }

    /// Select a chip for `key`; both sides take the chip's values.
    pub fn select_chip(&mut self, key: &str, chip: ChipPair) -> bool {
        let applied = self.sheet.set_chip(key, chip);
        if applied && matches!(self.step(), Step::Summary) {
            self.refresh_summary();
        }
        applied
    }

    /// A category step may be left once both sides have a score.
    pub fn can_advance(&self, number: usize) -> bool {
        match self.step_at(number) {
            Step::Category(category) => self.sheet.is_scored(&category.key),
            Step::Summary => true,
        }
    }

    /// Move forward one step, recomputing the summary when it is reached.
    pub fn advance(&mut self) -> Result<usize, ValidationError> {
        if let Step::Category(category) = self.step() {
            if !self.sheet.is_scored(&category.key) {
                return Err(ValidationError::IncompleteStep {
                    step: self.current,
                    label: category.display_label().to_string(),
                });
            }
        } else {
            return Ok(self.current);
        }

        self.current += 1;
        debug!(step = self.current, "advanced judging step");
        if matches!(self.step(), Step::Summary) {
            self.refresh_summary();
        }
        Ok(self.current)
    }

    /// Move back one step; returns `false` on the first step.
    pub fn retreat(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Take the current match from an overlay poll.
    pub fn load_match(&mut self, snapshot: &OverlaySnapshot) -> NowPanel {
        self.loaded = match snapshot {
            OverlaySnapshot::Empty => None,
            OverlaySnapshot::Active(current) => Some(LoadedMatch {
                weight_class: current.weight_class.clone(),
                red: current.red.name.clone(),
                white: current.white.name.clone(),
            }),
        };
        NowPanel::from(snapshot)
    }

    fn refresh_summary(&mut self) {
        let tally = self.sheet.recompute();
        self.summary = Some(self.build_summary(&tally));
    }

    fn build_summary(&self, tally: &Tally) -> SummaryView {
        let (winner, result) = match tally.outcome {
            Some(Outcome::RedLeads) => ("Red Wins JD", "Red wins JD"),
            Some(Outcome::WhiteLeads) => ("White Wins JD", "White wins JD"),
            Some(Outcome::Draw) => ("Draw", "Draw"),
            None => ("—", ""),
        };
        let lines = self
            .sheet
            .categories()
            .map(|category| {
                let entry = self.sheet.entry(&category.key);
                SummaryLine {
                    key: category.key.clone(),
                    label: category.display_label().to_string(),
                    red: entry.as_ref().map(|e| e.red),
                    white: entry.as_ref().map(|e| e.white),
                }
            })
            .collect();

        SummaryView {
            total_red: tally.total_red,
            total_white: tally.total_white,
            winner: winner.into(),
            result: result.into(),
            lines,
        }
    }

    /// Current values of the hidden form fields.
    pub fn legacy_form(&self) -> LegacyForm {
        let loaded = self.loaded.clone().unwrap_or_default();
        let scores = self
            .sheet
            .categories()
            .map(|category| {
                let entry = self.sheet.entry(&category.key);
                (
                    category.key.clone(),
                    entry.as_ref().map_or(0, |e| e.red),
                    entry.as_ref().map_or(0, |e| e.white),
                )
            })
            .collect();

        LegacyForm {
            weight_class: loaded.weight_class,
            red: loaded.red,
            white: loaded.white,
            result: self
                .summary
                .as_ref()
                .map(|summary| summary.result.clone())
                .unwrap_or_default(),
            scores,
        }
    }

    /// Form ready to post, or why it must not be posted.
    pub fn submit_form(&self) -> Result<LegacyForm, ValidationError> {
        let form = self.legacy_form();
        if form.red.trim().is_empty() || form.white.trim().is_empty() || form.result.is_empty() {
            return Err(ValidationError::IncompleteMatchData);
        }
        Ok(form)
    }
}
