pub mod judging;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::AppConfig;

use self::judging::{JudgingState, RobotProfile, RosterEntry, roster_key};

pub type SharedState = Arc<AppState>;

/// Central application state: configuration, the judging table and the robot roster.
pub struct AppState {
    config: AppConfig,
    judging: RwLock<JudgingState>,
    roster: DashMap<String, RosterEntry>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Robots listed in the configuration are registered up front.
    pub fn new(config: AppConfig) -> SharedState {
        let state = Self {
            judging: RwLock::new(JudgingState::default()),
            roster: DashMap::new(),
            config,
        };
        for entry in state.config.robots() {
            state.register_robot(&entry.weight_class, entry.profile.clone());
        }
        Arc::new(state)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current and finished matches plus the published version.
    pub fn judging(&self) -> &RwLock<JudgingState> {
        &self.judging
    }

    /// Add or replace a robot under `weight_class`.
    pub fn register_robot(&self, weight_class: &str, profile: RobotProfile) {
        let key = roster_key(weight_class, &profile.name);
        debug!(%key, "registering robot");
        self.roster.insert(
            key,
            RosterEntry {
                weight_class: weight_class.trim().to_string(),
                profile,
            },
        );
    }

    /// Robot registered under `weight_class`, matched case- and whitespace-insensitively.
    pub fn robot(&self, weight_class: &str, name: &str) -> Option<RosterEntry> {
        self.roster
            .get(&roster_key(weight_class, name))
            .map(|entry| entry.value().clone())
    }
}
