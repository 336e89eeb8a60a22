//! Application-level configuration loading: judged categories, panel size and
//! the robot roster known to the server.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{judge::model::Category, state::judging::RosterEntry};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BOUT_JUDGE_CONFIG_PATH";
/// Judges per match when the config does not say otherwise.
pub const DEFAULT_JUDGE_COUNT: u32 = 3;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    categories: Vec<Category>,
    chip_categories: Vec<Category>,
    judge_count: u32,
    robots: Vec<RosterEntry>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the built-in categories.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        categories = app_config.categories.len(),
                        judges = app_config.judge_count,
                        robots = app_config.robots.len(),
                        "loaded judging config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Override the panel size; mostly useful in tests.
    pub fn with_judge_count(mut self, judge_count: u32) -> Self {
        self.judge_count = judge_count.max(1);
        self
    }

    /// Slider categories in display order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Categories of the multi-step chip page.
    pub fn chip_categories(&self) -> &[Category] {
        &self.chip_categories
    }

    pub fn judge_count(&self) -> u32 {
        self.judge_count
    }

    /// Robots known before any match is installed.
    pub fn robots(&self) -> &[RosterEntry] {
        &self.robots
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            chip_categories: default_chip_categories(),
            judge_count: DEFAULT_JUDGE_COUNT,
            robots: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    chip_categories: Vec<Category>,
    #[serde(default)]
    judge_count: Option<u32>,
    #[serde(default)]
    robots: Vec<RosterEntry>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let categories = non_empty_or(value.categories, default_categories);
        let chip_categories = non_empty_or(value.chip_categories, default_chip_categories);
        Self {
            categories,
            chip_categories,
            judge_count: value
                .judge_count
                .filter(|count| *count > 0)
                .unwrap_or(DEFAULT_JUDGE_COUNT),
            robots: value.robots,
        }
    }
}

fn non_empty_or(categories: Vec<Category>, fallback: fn() -> Vec<Category>) -> Vec<Category> {
    let kept: Vec<Category> = categories
        .into_iter()
        .filter(|category| !category.key.trim().is_empty())
        .collect();
    if kept.is_empty() { fallback() } else { kept }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in slider categories.
fn default_categories() -> Vec<Category> {
    vec![
        Category::new("damage", "Damage", 8),
        Category::new("aggression", "Aggression", 5),
        Category::new("control", "Control", 6),
    ]
}

/// Built-in chip categories of the multi-step page.
fn default_chip_categories() -> Vec<Category> {
    vec![
        Category::new("aggr", "Aggression", 3),
        Category::new("ctrl", "Control", 3),
        Category::new("dmg", "Damage", 5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_total_nineteen_points() {
        let config = AppConfig::default();
        let total: u32 = config.categories().iter().map(|c| c.max).sum();
        assert_eq!(total, 19);
        assert_eq!(config.judge_count(), 3);
        assert_eq!(config.chip_categories()[2].key, "dmg");
    }

    #[test]
    fn raw_config_falls_back_per_section() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"categories": [{"key": "style", "label": "Style", "max": 4}], "judge_count": 0}"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.categories(), &[Category::new("style", "Style", 4)]);
        assert_eq!(config.chip_categories().len(), 3);
        assert_eq!(config.judge_count(), DEFAULT_JUDGE_COUNT);
    }
}
