//! Red/white score sheet shared by the slider panel and the multi-step chip flow.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

/// A judged category as configured for the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    /// Stable identifier used in payloads and storage keys.
    pub key: String,
    /// Display label; falls back to the key when empty.
    #[serde(default)]
    pub label: String,
    /// Points available in this category.
    pub max: u32,
}

impl Category {
    /// Build a category from its parts.
    pub fn new(key: impl Into<String>, label: impl Into<String>, max: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            max,
        }
    }

    /// Label shown to judges, defaulting to the key.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.key
        } else {
            &self.label
        }
    }

    /// Every split of `max` points between the two sides, red-heavy first.
    ///
    /// These are the chips offered by the multi-step page.
    pub fn chip_pairs(&self) -> Vec<ChipPair> {
        (0..=self.max)
            .rev()
            .map(|red| ChipPair {
                red,
                white: self.max - red,
            })
            .collect()
    }

    fn clamp(&self, value: i64) -> u32 {
        value.clamp(0, i64::from(self.max)) as u32
    }
}

/// How a sheet pairs the two sides of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// One slider drives both sides; `red + white == max` at all times.
    Complementary,
    /// Sides are picked independently from fixed chip pairs.
    Discrete,
}

/// Corner of the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Red,
    White,
}

/// A fixed red/white pair offered as a single selectable chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipPair {
    pub red: u32,
    pub white: u32,
}

/// A fully scored category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEntry {
    pub key: String,
    pub red: u32,
    pub white: u32,
}

/// Who is ahead on the current sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    RedLeads,
    WhiteLeads,
    Draw,
}

impl Outcome {
    /// Strict comparison of totals; equal totals are a draw.
    pub fn from_totals(total_red: u32, total_white: u32) -> Self {
        match total_red.cmp(&total_white) {
            std::cmp::Ordering::Greater => Outcome::RedLeads,
            std::cmp::Ordering::Less => Outcome::WhiteLeads,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

/// One row of the per-category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownLine {
    pub key: String,
    pub label: String,
    pub red: u32,
    pub white: u32,
}

/// Derived totals for a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total_red: u32,
    pub total_white: u32,
    /// `None` until at least one side of one category has been scored.
    pub outcome: Option<Outcome>,
    /// Scored categories in declaration order.
    pub breakdown: Vec<BreakdownLine>,
}

impl Tally {
    /// `"<red>-<white>"`.
    pub fn scoreline(&self) -> String {
        format!("{}-{}", self.total_red, self.total_white)
    }

    /// `"Label R-W, Label R-W"` in declaration order.
    pub fn breakdown_text(&self) -> String {
        self.breakdown
            .iter()
            .map(|line| format!("{} {}-{}", line.label, line.red, line.white))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone)]
struct Slot {
    category: Category,
    red: Option<u32>,
    white: Option<u32>,
}

impl Slot {
    fn entry(&self) -> Option<ScoreEntry> {
        Some(ScoreEntry {
            key: self.category.key.clone(),
            red: self.red?,
            white: self.white?,
        })
    }
}

/// Ordered per-category scores for one judge and one match.
#[derive(Debug, Clone)]
pub struct ScoreSheet {
    mode: ScoreMode,
    slots: IndexMap<String, Slot>,
}

impl ScoreSheet {
    /// Create an empty sheet over `categories`, keeping their order.
    pub fn new(mode: ScoreMode, categories: impl IntoIterator<Item = Category>) -> Self {
        let slots = categories
            .into_iter()
            .map(|category| {
                (
                    category.key.clone(),
                    Slot {
                        category,
                        red: None,
                        white: None,
                    },
                )
            })
            .collect();
        Self { mode, slots }
    }

    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    /// Configured categories in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.slots.values().map(|slot| &slot.category)
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.slots.get(key).map(|slot| &slot.category)
    }

    /// Record `value` points for `side` in category `key`.
    ///
    /// The value is clamped to `[0, max]`. In complementary mode the other side
    /// becomes `max - value`; in discrete mode only `side` changes. Unknown keys
    /// are ignored. Returns whether a category was updated.
    pub fn set_score(&mut self, key: &str, value: i64, side: Side) -> bool {
        let mode = self.mode;
        let Some(slot) = self.slots.get_mut(key) else {
            debug!(key, "ignoring score for unknown category");
            return false;
        };

        let points = slot.category.clamp(value);
        match (mode, side) {
            (ScoreMode::Complementary, Side::Red) => {
                slot.red = Some(points);
                slot.white = Some(slot.category.max - points);
            }
            (ScoreMode::Complementary, Side::White) => {
                slot.white = Some(points);
                slot.red = Some(slot.category.max - points);
            }
            (ScoreMode::Discrete, Side::Red) => slot.red = Some(points),
            (ScoreMode::Discrete, Side::White) => slot.white = Some(points),
        }
        true
    }

    /// Store both sides from a selected chip.
    ///
    /// In complementary mode the red side of the chip wins and white is derived
    /// from it so the sum invariant survives a mismatched chip.
    pub fn set_chip(&mut self, key: &str, chip: ChipPair) -> bool {
        if self.mode == ScoreMode::Complementary {
            return self.set_score(key, i64::from(chip.red), Side::Red);
        }

        let Some(slot) = self.slots.get_mut(key) else {
            debug!(key, "ignoring chip for unknown category");
            return false;
        };
        slot.red = Some(slot.category.clamp(i64::from(chip.red)));
        slot.white = Some(slot.category.clamp(i64::from(chip.white)));
        true
    }

    /// Both sides of `key` have a score.
    pub fn is_scored(&self, key: &str) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.red.is_some() && slot.white.is_some())
    }

    /// Every configured category is fully scored.
    pub fn is_complete(&self) -> bool {
        self.slots
            .values()
            .all(|slot| slot.red.is_some() && slot.white.is_some())
    }

    pub fn entry(&self, key: &str) -> Option<ScoreEntry> {
        self.slots.get(key).and_then(Slot::entry)
    }

    /// Totals, outcome and breakdown of the current scores.
    pub fn recompute(&self) -> Tally {
        let mut total_red = 0;
        let mut total_white = 0;
        let mut any_scored = false;
        let mut breakdown = Vec::with_capacity(self.slots.len());

        for slot in self.slots.values() {
            if let Some(red) = slot.red {
                total_red += red;
                any_scored = true;
            }
            if let Some(white) = slot.white {
                total_white += white;
                any_scored = true;
            }
            if let Some(entry) = slot.entry() {
                breakdown.push(BreakdownLine {
                    key: entry.key,
                    label: slot.category.display_label().to_string(),
                    red: entry.red,
                    white: entry.white,
                });
            }
        }

        Tally {
            total_red,
            total_white,
            outcome: any_scored.then(|| Outcome::from_totals(total_red, total_white)),
            breakdown,
        }
    }

    /// Red points per fully scored category, as expected by the submit endpoint.
    pub fn submission_sliders(&self) -> IndexMap<String, u32> {
        self.slots
            .values()
            .filter_map(Slot::entry)
            .map(|entry| (entry.key, entry.red))
            .collect()
    }

    /// Forget every score while keeping the categories.
    pub fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            slot.red = None;
            slot.white = None;
        }
    }
}
