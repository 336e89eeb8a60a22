//! Judge cards, per-match aggregation and the versioned judging state.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::judge::model::Category;

/// A robot as the server knows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RobotProfile {
    pub name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub elo: Option<i64>,
}

impl RobotProfile {
    /// Profile carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A robot registered under a weight class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub weight_class: String,
    #[serde(flatten)]
    pub profile: RobotProfile,
}

/// Lookup key tolerant of case and whitespace differences.
pub fn roster_key(weight_class: &str, name: &str) -> String {
    format!("{}/{}", collapse(weight_class), collapse(name))
}

fn collapse(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Winner of one card, or of a whole match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CardWinner {
    Red,
    White,
    Draw,
}

impl CardWinner {
    fn from_totals(red: u32, white: u32) -> Self {
        match red.cmp(&white) {
            std::cmp::Ordering::Greater => CardWinner::Red,
            std::cmp::Ordering::Less => CardWinner::White,
            std::cmp::Ordering::Equal => CardWinner::Draw,
        }
    }
}

/// How a match was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Decision {
    #[serde(rename = "unanimous decision")]
    Unanimous,
    #[serde(rename = "majority decision")]
    Majority,
    #[serde(rename = "split decision")]
    Split,
    /// A leader exists but not every judge has scored yet.
    #[serde(rename = "decision")]
    Pending,
    #[serde(rename = "draw")]
    Draw,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::Unanimous => "unanimous decision",
            Decision::Majority => "majority decision",
            Decision::Split => "split decision",
            Decision::Pending => "decision",
            Decision::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
/// Points on each side.
pub struct Points {
    pub red: u32,
    pub white: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryScore {
    pub label: String,
    pub max: u32,
    pub red: u32,
    pub white: u32,
}

/// One judge's submitted scorecard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JudgeCard {
    pub judge_id: u32,
    pub judge_name: String,
    /// Unix seconds.
    pub submitted_at: i64,
    /// Sanitized red points per category.
    pub sliders: IndexMap<String, u32>,
    pub scores: IndexMap<String, CategoryScore>,
    pub totals: Points,
    pub winner: CardWinner,
    /// `"R-W"`.
    pub scoreline: String,
    /// `"Damage 5-3 · Aggression 2-3"`.
    pub breakdown: String,
}

/// Clamp raw red points to `[0, max]` for every configured category.
///
/// Missing, non-numeric or non-integral values count as `max / 2`.
pub fn sanitize_sliders(categories: &[Category], raw: &IndexMap<String, Value>) -> IndexMap<String, u32> {
    categories
        .iter()
        .map(|category| {
            let fallback = category.max / 2;
            let value = raw
                .get(&category.key)
                .and_then(slider_value)
                .map_or(fallback, |points| {
                    points.clamp(0, i64::from(category.max)) as u32
                });
            (category.key.clone(), value)
        })
        .collect()
}

fn slider_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

/// Build a card from raw sliders carrying red points; white is `max - red`.
pub fn create_judge_card(
    categories: &[Category],
    judge_id: u32,
    raw_sliders: &IndexMap<String, Value>,
    judge_name: &str,
    submitted_at: i64,
) -> JudgeCard {
    let sliders = sanitize_sliders(categories, raw_sliders);
    let mut scores = IndexMap::with_capacity(categories.len());
    let mut totals = Points::default();
    let mut parts = Vec::with_capacity(categories.len());

    for category in categories {
        let red = sliders.get(&category.key).copied().unwrap_or_default();
        let white = category.max - red;
        totals.red += red;
        totals.white += white;
        parts.push(format!("{} {red}-{white}", category.display_label()));
        scores.insert(
            category.key.clone(),
            CategoryScore {
                label: category.display_label().to_string(),
                max: category.max,
                red,
                white,
            },
        );
    }

    JudgeCard {
        judge_id,
        judge_name: judge_name.trim().to_string(),
        submitted_at,
        sliders,
        scores,
        winner: CardWinner::from_totals(totals.red, totals.white),
        scoreline: format!("{}-{}", totals.red, totals.white),
        breakdown: parts.join(" · "),
        totals,
    }
}

/// A match on the judging table, current or finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgedMatch {
    pub match_id: String,
    pub weight_class: String,
    pub red: String,
    pub white: String,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub judges: BTreeMap<u32, JudgeCard>,
}

impl JudgedMatch {
    /// Fresh match with a random hex identifier and no cards.
    pub fn new(weight_class: &str, red: &str, white: &str, created_at: i64) -> Self {
        Self {
            match_id: Uuid::new_v4().simple().to_string(),
            weight_class: weight_class.trim().to_string(),
            red: red.trim().to_string(),
            white: white.trim().to_string(),
            created_at,
            completed_at: None,
            judges: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct WinnerCounts {
    pub red: u32,
    pub white: u32,
    pub draw: u32,
}

/// Aggregate view of every card a match has received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub counts: WinnerCounts,
    pub winner: CardWinner,
    pub winner_name: Option<String>,
    pub decision: Decision,
    pub scorecard_strings: Vec<String>,
    pub pending_judges: Vec<u32>,
    pub is_complete: bool,
    pub judge_cards: Vec<JudgeCard>,
    pub headline: String,
}

/// Count card winners and derive the decision and headline for `judged`.
pub fn compute_match_summary(judged: &JudgedMatch, judge_count: u32) -> MatchSummary {
    let mut counts = WinnerCounts::default();
    let mut pending = Vec::new();
    let mut cards = Vec::new();

    for judge_id in 1..=judge_count {
        match judged.judges.get(&judge_id) {
            Some(card) => {
                match card.winner {
                    CardWinner::Red => counts.red += 1,
                    CardWinner::White => counts.white += 1,
                    CardWinner::Draw => counts.draw += 1,
                }
                cards.push(card.clone());
            }
            None => pending.push(judge_id),
        }
    }

    let is_complete = judge_count > 0 && cards.len() == judge_count as usize;
    let winner = match counts.red.cmp(&counts.white) {
        std::cmp::Ordering::Greater => CardWinner::Red,
        std::cmp::Ordering::Less => CardWinner::White,
        std::cmp::Ordering::Equal => CardWinner::Draw,
    };

    let red_name = non_empty_or(&judged.red, "Red");
    let white_name = non_empty_or(&judged.white, "White");
    let (winner_name, decision) = match winner {
        CardWinner::Draw => (None, Decision::Draw),
        side => {
            let name = if side == CardWinner::Red { red_name } else { white_name };
            let wins = if side == CardWinner::Red { counts.red } else { counts.white };
            let decision = if !is_complete {
                Decision::Pending
            } else if wins == judge_count {
                Decision::Unanimous
            } else if wins + counts.draw == judge_count && counts.draw > 0 {
                Decision::Majority
            } else {
                Decision::Split
            };
            (Some(name.to_string()), decision)
        }
    };

    let scorecard_strings: Vec<String> = cards
        .iter()
        .map(|card| {
            format!(
                "Judge {}: {red_name} {}-{} {white_name}",
                card.judge_id, card.totals.red, card.totals.white
            )
        })
        .collect();

    let headline = if is_complete {
        let base = match &winner_name {
            Some(name) => format!("{name} wins via {}", decision.label()),
            None => "Draw".to_string(),
        };
        format!("{base} — {}", scorecard_strings.join(" · "))
    } else {
        let mut headline = "Waiting for judges scores...".to_string();
        if !scorecard_strings.is_empty() {
            headline.push_str(&format!(" (have: {})", scorecard_strings.join(" · ")));
        }
        if !pending.is_empty() {
            let plural = if pending.len() > 1 { "s" } else { "" };
            let ids = pending
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            headline.push_str(&format!(" — Pending Judge{plural} {ids}"));
        }
        headline
    };

    MatchSummary {
        counts,
        winner,
        winner_name,
        decision,
        scorecard_strings,
        pending_judges: pending,
        is_complete,
        judge_cards: cards,
        headline,
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

/// Result recorded through the legacy match form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LegacyResult {
    pub weight_class: String,
    pub red: String,
    pub white: String,
    pub result: String,
    pub scores: IndexMap<String, Points>,
    pub recorded_at: i64,
}

/// Results the legacy form accepts.
pub const LEGACY_RESULTS: [&str; 5] = [
    "Red wins JD",
    "Red wins KO",
    "White wins JD",
    "White wins KO",
    "Draw",
];

/// Everything the judging surfaces poll, plus the version they gate on.
#[derive(Debug, Clone, Default)]
pub struct JudgingState {
    pub current: Option<JudgedMatch>,
    /// Finished matches, most recent first.
    pub history: Vec<JudgedMatch>,
    pub results: Vec<LegacyResult>,
    version: u64,
    updated_at: Option<String>,
}

impl JudgingState {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    /// Record a mutation; the version only ever grows.
    pub fn touch(&mut self) -> u64 {
        self.version += 1;
        self.updated_at = OffsetDateTime::now_utc().format(&Rfc3339).ok();
        self.version
    }

    /// Move the current match into history once every judge has scored.
    pub fn finalize_if_complete(&mut self, judge_count: u32, now: i64) -> bool {
        let complete = self
            .current
            .as_ref()
            .is_some_and(|judged| compute_match_summary(judged, judge_count).is_complete);
        if !complete {
            return false;
        }
        if let Some(mut finished) = self.current.take() {
            finished.completed_at = Some(now);
            self.history.insert(0, finished);
        }
        true
    }
}

/// Current wall-clock time in unix seconds.
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
