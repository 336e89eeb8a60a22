//! Data the host page hands to the judging core, and the overlay snapshot it polls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::judge::{model::Category, poller::normalize_version};

/// A robot and its crew as shown on judging surfaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub elo: Option<i64>,
}

impl Competitor {
    /// `"driver • team • 1000 ELO"`.
    pub fn meta_line(&self) -> String {
        let elo = self
            .elo
            .map(|elo| elo.to_string())
            .unwrap_or_else(|| "—".into());
        format!("{} • {} • {} ELO", self.driver, self.team, elo)
    }
}

/// The match being judged; immutable while the page is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRef {
    pub match_id: String,
    #[serde(default)]
    pub weight_class: String,
    pub red: Competitor,
    pub white: Competitor,
}

impl MatchRef {
    pub fn red_name(&self) -> &str {
        non_empty_or(&self.red.name, "Red")
    }

    pub fn white_name(&self) -> &str {
        non_empty_or(&self.white.name, "White")
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Who is judging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgeIdentity {
    name: String,
}

impl JudgeIdentity {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// Endpoints advertised by the host page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiEndpoints {
    #[serde(default)]
    pub submit: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Version of the snapshot the page was rendered from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub version: Value,
}

impl PageMeta {
    /// Rendered version, `0` when absent or unreadable.
    pub fn version(&self) -> u64 {
        normalize_version(&self.version).unwrap_or(0)
    }
}

/// A card the server already holds for this judge and match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedCard {
    #[serde(default)]
    pub judge_name: String,
    #[serde(default)]
    pub scoreline: String,
    #[serde(default)]
    pub breakdown: String,
}

/// Configuration the host page embeds for the slider judging panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgePageConfig {
    #[serde(default)]
    pub current: Option<MatchRef>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub api: ApiEndpoints,
    #[serde(default)]
    pub meta: PageMeta,
    #[serde(default)]
    pub existing_submission: Option<RecordedCard>,
}

impl JudgePageConfig {
    /// Parse the JSON blob the server renders into the judge page.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Endpoints of the multi-step chip page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEndpoints {
    #[serde(default = "default_step_submit")]
    pub submit: String,
    #[serde(default = "default_overlay")]
    pub overlay: String,
}

impl Default for StepEndpoints {
    fn default() -> Self {
        Self {
            submit: default_step_submit(),
            overlay: default_overlay(),
        }
    }
}

fn default_step_submit() -> String {
    "/submit_match".into()
}

fn default_overlay() -> String {
    "/overlay".into()
}

/// Configuration served to the multi-step chip page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepPageConfig {
    /// Chip categories in step order.
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub api: StepEndpoints,
}

/// Match currently announced by the overlay endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMatch {
    pub match_id: Option<String>,
    pub weight_class: String,
    pub red: Competitor,
    pub white: Competitor,
    pub version: Option<u64>,
}

/// Parsed `/overlay` response.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlaySnapshot {
    Empty,
    Active(OverlayMatch),
}

#[derive(Deserialize)]
struct RawOverlay {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    match_id: Option<String>,
    #[serde(default)]
    weight_class: Option<String>,
    #[serde(default)]
    red: Option<Competitor>,
    #[serde(default)]
    white: Option<Competitor>,
    #[serde(default)]
    meta: Option<RawMeta>,
}

#[derive(Deserialize)]
struct RawMeta {
    #[serde(default)]
    version: Value,
}

impl OverlaySnapshot {
    /// Interpret an overlay body; anything without both corners counts as empty.
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        let raw = RawOverlay::deserialize(value)?;
        if raw.status.as_deref() == Some("empty") {
            return Ok(OverlaySnapshot::Empty);
        }
        let (Some(red), Some(white)) = (raw.red, raw.white) else {
            return Ok(OverlaySnapshot::Empty);
        };
        Ok(OverlaySnapshot::Active(OverlayMatch {
            match_id: raw.match_id,
            weight_class: raw.weight_class.unwrap_or_default(),
            red,
            white,
            version: raw.meta.and_then(|meta| normalize_version(&meta.version)),
        }))
    }
}

/// Text of the "Now" panel shown above the judging slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPanel {
    pub status: String,
    pub weight_class: String,
    pub red_name: String,
    pub white_name: String,
    pub red_meta: String,
    pub white_meta: String,
}

impl From<&OverlaySnapshot> for NowPanel {
    fn from(snapshot: &OverlaySnapshot) -> Self {
        match snapshot {
            OverlaySnapshot::Empty => Self {
                status: "No matches scheduled".into(),
                weight_class: "—".into(),
                red_name: "—".into(),
                white_name: "—".into(),
                red_meta: String::new(),
                white_meta: String::new(),
            },
            OverlaySnapshot::Active(current) => Self {
                status: "Ready to judge".into(),
                weight_class: non_empty_or(&current.weight_class, "—").to_string(),
                red_name: non_empty_or(&current.red.name, "—").to_string(),
                white_name: non_empty_or(&current.white.name, "—").to_string(),
                red_meta: current.red.meta_line(),
                white_meta: current.white.meta_line(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_page_defaults_its_endpoints() {
        let config: StepPageConfig = serde_json::from_value(json!({
            "categories": [{"key": "dmg", "label": "Damage", "max": 5}]
        }))
        .unwrap();
        assert_eq!(config.categories[0].max, 5);
        assert_eq!(config.api.submit, "/submit_match");
        assert_eq!(config.api.overlay, "/overlay");
    }

    #[test]
    fn empty_overlay() {
        let snapshot = OverlaySnapshot::from_value(&json!({"status": "empty"})).unwrap();
        assert_eq!(snapshot, OverlaySnapshot::Empty);
        assert_eq!(NowPanel::from(&snapshot).status, "No matches scheduled");
    }

    #[test]
    fn active_overlay_with_version() {
        let body = json!({
            "status": "active",
            "weight_class": "Beetleweights",
            "red": {"name": "Sawblaze", "driver": "Jo", "team": "Blades", "elo": 1032},
            "white": {"name": "Hypnotic", "driver": "Mo", "team": "Spin", "elo": 998},
            "meta": {"version": 12}
        });
        let OverlaySnapshot::Active(current) = OverlaySnapshot::from_value(&body).unwrap() else {
            panic!("expected an active overlay");
        };
        assert_eq!(current.version, Some(12));
        assert_eq!(current.red.meta_line(), "Jo • Blades • 1032 ELO");

        let panel = NowPanel::from(&OverlaySnapshot::Active(current));
        assert_eq!(panel.status, "Ready to judge");
        assert_eq!(panel.white_name, "Hypnotic");
    }

    #[test]
    fn page_config_parses_host_blob() {
        let raw = r#"{
            "current": {"match_id": "abc", "red": {"name": "A"}, "white": {"name": ""}},
            "categories": [{"key": "damage", "label": "Damage", "max": 8}],
            "api": {"submit": "/api/judge/1/submit", "state": "/api/judge/state"},
            "meta": {"version": 4}
        }"#;
        let page = JudgePageConfig::from_json(raw).unwrap();
        let current = page.current.unwrap();
        assert_eq!(current.red_name(), "A");
        assert_eq!(current.white_name(), "White");
        assert_eq!(page.meta.version(), 4);
        assert_eq!(page.categories[0].max, 8);
    }
}
